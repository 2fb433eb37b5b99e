//! Reading the map request out of `data-*` attributes.
//!
//! Values are JSON-encoded by the page templates, so numbers are parsed with
//! JSON number syntax (`43.77`, ` 1e2 `), never leniently (`"43.77"`, `43,77`).

use serde_json::Value;

use crate::error::{MapError, Result};
use crate::models::{
    is_valid_latitude, is_valid_longitude, LatLng, LocationPoint, MapRequest, MapView,
    SearchResultSet,
};
use crate::settings::PageLayout;

/// Read-only view of the page's data attributes.
pub trait DataSource {
    fn has_element(&self, element_id: &str) -> bool;

    /// Raw value of `data-{key}` on the element, `None` if either is absent.
    fn attribute(&self, element_id: &str, key: &str) -> Option<String>;
}

/// Parse a JSON number. Strings, `null` and non-finite values are rejected.
pub fn parse_json_number(raw: &str) -> Option<f64> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Parse a JSON non-negative integer. `3.0` is accepted, `3.5` and `-1` are not.
pub fn parse_json_count(raw: &str) -> Option<usize> {
    match serde_json::from_str::<Value>(raw).ok()? {
        Value::Number(n) => match n.as_u64() {
            Some(v) => usize::try_from(v).ok(),
            None => n
                .as_f64()
                .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= usize::MAX as f64)
                .map(|v| v as usize),
        },
        _ => None,
    }
}

/// Escape a label for insertion into popup HTML.
pub fn escape_html(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn required(source: &impl DataSource, element: &str, key: &str) -> Result<String> {
    source
        .attribute(element, key)
        .ok_or_else(|| MapError::missing(element, key))
}

fn read_coordinate(
    source: &impl DataSource,
    element: &str,
    key: &str,
    in_range: fn(f64) -> bool,
) -> Result<f64> {
    let raw = required(source, element, key)?;
    parse_json_number(&raw)
        .filter(|v| in_range(*v))
        .ok_or_else(|| MapError::invalid_coordinate(element, key, &raw))
}

fn read_latlng(
    source: &impl DataSource,
    element: &str,
    lat_key: &str,
    lng_key: &str,
) -> Result<LatLng> {
    let latitude = read_coordinate(source, element, lat_key, is_valid_latitude)?;
    let longitude = read_coordinate(source, element, lng_key, is_valid_longitude)?;
    Ok(LatLng::new(latitude, longitude))
}

/// `None` when neither key is present; a half-present pair is missing data.
fn read_optional_latlng(
    source: &impl DataSource,
    element: &str,
    lat_key: &str,
    lng_key: &str,
) -> Result<Option<LatLng>> {
    let has_lat = source.attribute(element, lat_key).is_some();
    let has_lng = source.attribute(element, lng_key).is_some();
    if !has_lat && !has_lng {
        return Ok(None);
    }
    read_latlng(source, element, lat_key, lng_key).map(Some)
}

fn read_point(
    source: &impl DataSource,
    element: &str,
    layout: &PageLayout,
    label_key: &str,
) -> Result<LocationPoint> {
    let position = read_latlng(source, element, &layout.latitude_key, &layout.longitude_key)?;
    let label = required(source, element, label_key)?;
    Ok(LocationPoint { position, label })
}

/// Read the declared count and every `order{rank}` block it promises.
pub fn read_results(source: &impl DataSource, layout: &PageLayout) -> Result<SearchResultSet> {
    let element = &layout.results_element;
    let raw = required(source, element, &layout.length_key)?;
    let count = parse_json_count(&raw).ok_or_else(|| MapError::InvalidCount {
        element: element.clone(),
        key: layout.length_key.clone(),
        value: raw.clone(),
    })?;

    let mut results = Vec::new();
    for rank in 1..=count {
        let block = layout.result_element(rank);
        results.push(read_point(source, &block, layout, &layout.result_name_key)?);
    }
    tracing::debug!(count, "read search results");
    Ok(SearchResultSet::new(results))
}

impl MapRequest {
    /// Read and validate everything the renderer needs.
    ///
    /// Fails on the first missing or malformed value; nothing partial is returned.
    pub fn read(source: &impl DataSource, layout: &PageLayout) -> Result<Self> {
        let map = &layout.map_element;
        let explicit_center =
            read_optional_latlng(source, map, &layout.latitude_key, &layout.longitude_key)?;
        let viewer = read_optional_latlng(
            source,
            map,
            &layout.viewer_latitude_key,
            &layout.viewer_longitude_key,
        )?;
        let center = explicit_center
            .or(viewer)
            .ok_or_else(|| MapError::missing(map, &layout.latitude_key))?;

        let has_point = source.attribute(map, &layout.point_name_key).is_some();
        let view = if source.has_element(&layout.results_element) {
            if has_point {
                tracing::warn!(
                    element = %map,
                    "page has both a result set and a single point; showing the results"
                );
            }
            MapView::Results(read_results(source, layout)?)
        } else if has_point {
            MapView::Location(read_point(source, map, layout, &layout.point_name_key)?)
        } else {
            MapView::Bare
        };

        Ok(MapRequest {
            center,
            viewer,
            view,
        })
    }
}
