//! Map presentation settings and the page layout the renderer reads from.
//!
//! Defaults reproduce the shelter search pages: OpenStreetMap tiles at zoom 14
//! and a red circle around the viewer. A page may override any field with a
//! JSON object (see [`MapSettings::with_overrides`]).

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

pub const DEFAULT_ZOOM: u8 = 14;

/// Highest zoom level the OpenStreetMap tile servers provide.
pub const MAX_ZOOM: u8 = 19;

pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str =
    r#"&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors"#;

/// Viewer circle radius (meters) on a single-location page.
pub const LOCATION_VIEW_RADIUS_M: f64 = 300.0;
/// Viewer circle radius (meters) on a search-result page.
pub const RESULTS_VIEW_RADIUS_M: f64 = 250.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct CircleStyle {
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub location_radius: f64,
    pub results_radius: f64,
}

impl Default for CircleStyle {
    fn default() -> Self {
        CircleStyle {
            color: "red".to_string(),
            fill_color: "#f03".to_string(),
            fill_opacity: 0.5,
            location_radius: LOCATION_VIEW_RADIUS_M,
            results_radius: RESULTS_VIEW_RADIUS_M,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct MapSettings {
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
    pub circle: CircleStyle,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            zoom: DEFAULT_ZOOM,
            tile_url: OSM_TILE_URL.to_string(),
            attribution: OSM_ATTRIBUTION.to_string(),
            circle: CircleStyle::default(),
        }
    }
}

impl MapSettings {
    /// Defaults with the fields present in `json` replaced.
    ///
    /// `None` or a blank string yields the defaults.
    pub fn with_overrides(json: Option<&str>) -> Result<Self> {
        let settings = match json.map(str::trim) {
            Some(raw) if !raw.is_empty() => serde_json::from_str::<MapSettings>(raw)?,
            _ => MapSettings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.zoom > MAX_ZOOM {
            return Err(invalid(format!(
                "zoom {} exceeds maximum {}",
                self.zoom, MAX_ZOOM
            )));
        }
        if self.tile_url.trim().is_empty() {
            return Err(invalid("tile URL is empty".to_string()));
        }
        let c = &self.circle;
        if !(0.0..=1.0).contains(&c.fill_opacity) {
            return Err(invalid(format!(
                "fill opacity {} outside 0..=1",
                c.fill_opacity
            )));
        }
        for radius in [c.location_radius, c.results_radius] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(invalid(format!("circle radius {radius} must be positive")));
            }
        }
        Ok(())
    }
}

fn invalid(message: String) -> MapError {
    MapError::InvalidSettings { message }
}

/// Element ids and `data-*` keys the page templates use.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub map_element: String,
    pub results_element: String,
    /// Result blocks are `{result_prefix}{rank}`, e.g. `order1`.
    pub result_prefix: String,
    pub latitude_key: String,
    pub longitude_key: String,
    pub point_name_key: String,
    pub result_name_key: String,
    pub length_key: String,
    pub viewer_latitude_key: String,
    pub viewer_longitude_key: String,
    pub settings_key: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        PageLayout {
            map_element: "mapid".to_string(),
            results_element: "results".to_string(),
            result_prefix: "order".to_string(),
            latitude_key: "latitude".to_string(),
            longitude_key: "longitude".to_string(),
            point_name_key: "pointname".to_string(),
            result_name_key: "name".to_string(),
            length_key: "length".to_string(),
            viewer_latitude_key: "currentlat".to_string(),
            viewer_longitude_key: "currentlong".to_string(),
            settings_key: "map-settings".to_string(),
        }
    }
}

impl PageLayout {
    pub fn result_element(&self, rank: usize) -> String {
        format!("{}{}", self.result_prefix, rank)
    }
}
