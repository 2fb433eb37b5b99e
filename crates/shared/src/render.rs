use crate::attrs::{escape_html, DataSource};
use crate::error::Result;
use crate::models::{LatLng, MapRequest, MapView};
use crate::settings::{MapSettings, PageLayout};

#[derive(Debug, Clone, PartialEq)]
pub struct CircleSpec {
    pub center: LatLng,
    pub radius: f64,
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
}

/// The operations the renderer needs from a slippy-map widget.
pub trait MapBackend {
    fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<()>;

    fn add_tile_layer(&mut self, url_template: &str, attribution: &str) -> Result<()>;

    /// Add a pin with its popup already open. `popup_html` is escaped.
    fn add_marker(&mut self, position: LatLng, popup_html: &str) -> Result<()>;

    fn add_circle(&mut self, circle: &CircleSpec) -> Result<()>;
}

/// What ended up on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMap {
    pub center: LatLng,
    pub zoom: u8,
    pub view: &'static str,
    /// Marker positions in the order they were added.
    pub markers: Vec<LatLng>,
    /// Label of the popup left open, i.e. the last marker added.
    pub open_popup: Option<String>,
    pub viewer_radius: Option<f64>,
}

struct PlannedMarker<'a> {
    position: LatLng,
    label: &'a str,
    popup_html: String,
}

fn plan(position: LatLng, label: &str) -> PlannedMarker<'_> {
    PlannedMarker {
        position,
        label,
        popup_html: escape_html(label),
    }
}

fn planned_markers(view: &MapView) -> Vec<PlannedMarker<'_>> {
    match view {
        MapView::Bare => Vec::new(),
        MapView::Location(point) => vec![plan(point.position, &point.label)],
        MapView::Results(set) => set
            .draw_order()
            .map(|(_, point)| plan(point.position, &point.label))
            .collect(),
    }
}

fn viewer_radius(view: &MapView, settings: &MapSettings) -> f64 {
    match view {
        MapView::Results(_) => settings.circle.results_radius,
        MapView::Location(_) | MapView::Bare => settings.circle.location_radius,
    }
}

/// Draw a validated request onto `backend`.
///
/// Markers are prepared before the first backend call; the only failures past
/// that point come from the backend itself.
pub fn render_map<B: MapBackend>(
    request: &MapRequest,
    settings: &MapSettings,
    backend: &mut B,
) -> Result<RenderedMap> {
    settings.validate()?;
    let markers = planned_markers(&request.view);

    backend.set_view(request.center, settings.zoom)?;
    backend.add_tile_layer(&settings.tile_url, &settings.attribution)?;
    tracing::debug!(center = %request.center, zoom = settings.zoom, "map view initialized");

    let mut radius = None;
    if let Some(viewer) = request.viewer {
        let circle = CircleSpec {
            center: viewer,
            radius: viewer_radius(&request.view, settings),
            color: settings.circle.color.clone(),
            fill_color: settings.circle.fill_color.clone(),
            fill_opacity: settings.circle.fill_opacity,
        };
        backend.add_circle(&circle)?;
        radius = Some(circle.radius);
    }

    let mut positions = Vec::with_capacity(markers.len());
    for marker in &markers {
        backend.add_marker(marker.position, &marker.popup_html)?;
        positions.push(marker.position);
    }

    let rendered = RenderedMap {
        center: request.center,
        zoom: settings.zoom,
        view: request.view.kind(),
        markers: positions,
        open_popup: markers.last().map(|m| m.label.to_string()),
        viewer_radius: radius,
    };
    tracing::info!(
        view = rendered.view,
        markers = rendered.markers.len(),
        viewer = request.viewer.is_some(),
        "map rendered"
    );
    Ok(rendered)
}

/// Read the page and render it; a read failure leaves the backend untouched.
pub fn render_page<S: DataSource, B: MapBackend>(
    source: &S,
    layout: &PageLayout,
    settings: &MapSettings,
    backend: &mut B,
) -> Result<RenderedMap> {
    let request = MapRequest::read(source, layout)?;
    render_map(&request, settings, backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::tests::MemorySource;
    use crate::error::MapError;
    use crate::models::{LocationPoint, SearchResultSet};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        SetView(LatLng, u8),
        TileLayer(String),
        Marker(LatLng, String),
        Circle(CircleSpec),
    }

    /// Records calls and mimics the one-open-popup behavior of the real map.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
        open_popup: Option<String>,
        fail_on_marker: Option<usize>,
    }

    impl RecordingBackend {
        fn markers(&self) -> Vec<(LatLng, String)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Marker(p, html) => Some((*p, html.clone())),
                    _ => None,
                })
                .collect()
        }

        fn circles(&self) -> Vec<CircleSpec> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Circle(spec) => Some(spec.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl MapBackend for RecordingBackend {
        fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<()> {
            self.calls.push(Call::SetView(center, zoom));
            Ok(())
        }

        fn add_tile_layer(&mut self, url_template: &str, _attribution: &str) -> Result<()> {
            self.calls.push(Call::TileLayer(url_template.to_string()));
            Ok(())
        }

        fn add_marker(&mut self, position: LatLng, popup_html: &str) -> Result<()> {
            if self.fail_on_marker == Some(self.markers().len()) {
                return Err(MapError::Backend("marker rejected".to_string()));
            }
            self.calls.push(Call::Marker(position, popup_html.to_string()));
            self.open_popup = Some(popup_html.to_string());
            Ok(())
        }

        fn add_circle(&mut self, circle: &CircleSpec) -> Result<()> {
            self.calls.push(Call::Circle(circle.clone()));
            Ok(())
        }
    }

    fn render(page: &MemorySource) -> (Result<RenderedMap>, RecordingBackend) {
        let mut backend = RecordingBackend::default();
        let result = render_page(
            page,
            &PageLayout::default(),
            &MapSettings::default(),
            &mut backend,
        );
        (result, backend)
    }

    #[test]
    fn test_single_location_one_open_marker() {
        let page = MemorySource::location_page("43.7706", "142.3649", "Central Park");
        let (result, backend) = render(&page);
        let rendered = result.unwrap();
        let at = LatLng::new(43.7706, 142.3649);

        assert_eq!(rendered.center, at);
        assert_eq!(rendered.zoom, 14);
        assert_eq!(backend.calls[0], Call::SetView(at, 14));
        assert_eq!(backend.markers(), vec![(at, "Central Park".to_string())]);
        assert_eq!(backend.open_popup.as_deref(), Some("Central Park"));
        assert_eq!(rendered.open_popup.as_deref(), Some("Central Park"));
        assert!(backend.circles().is_empty());
    }

    #[test]
    fn test_tile_layer_follows_view() {
        let page = MemorySource::location_page("43.7", "142.3", "Park");
        let (_, backend) = render(&page);
        assert!(matches!(backend.calls[0], Call::SetView(..)));
        assert_eq!(
            backend.calls[1],
            Call::TileLayer(crate::settings::OSM_TILE_URL.to_string())
        );
    }

    #[test]
    fn test_result_sets_of_various_sizes() {
        for n in [0usize, 1, 5] {
            let page = MemorySource::results_page(n, n);
            let (result, backend) = render(&page);
            let rendered = result.unwrap();

            assert_eq!(backend.markers().len(), n, "n = {n}");
            assert_eq!(rendered.markers.len(), n);
            if n == 0 {
                assert!(backend.open_popup.is_none());
                assert!(rendered.open_popup.is_none());
            } else {
                assert_eq!(backend.open_popup.as_deref(), Some("Shelter 1"));
                assert_eq!(rendered.open_popup.as_deref(), Some("Shelter 1"));
            }
        }
    }

    #[test]
    fn test_results_drawn_worst_rank_first() {
        let page = MemorySource::results_page(5, 5);
        let (_, backend) = render(&page);
        let labels: Vec<String> = backend.markers().into_iter().map(|(_, l)| l).collect();
        assert_eq!(
            labels,
            vec!["Shelter 5", "Shelter 4", "Shelter 3", "Shelter 2", "Shelter 1"]
        );
    }

    #[test]
    fn test_count_mismatch_commits_nothing() {
        let page = MemorySource::results_page(5, 3);
        let (result, backend) = render(&page);
        assert!(matches!(result, Err(MapError::MissingData { .. })));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_invalid_center_creates_no_map() {
        let page = MemorySource::location_page("abc", "142.3", "Park");
        let (result, backend) = render(&page);
        assert!(matches!(result, Err(MapError::InvalidCoordinate { .. })));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_viewer_radius_300_for_location_view() {
        let page = MemorySource::location_page("43.7", "142.3", "Park")
            .attr("mapid", "currentlat", "43.8")
            .attr("mapid", "currentlong", "142.4");
        let (result, backend) = render(&page);
        let circles = backend.circles();
        assert_eq!(circles.len(), 1);
        assert!((circles[0].radius - 300.0).abs() < 1e-9);
        assert_eq!(circles[0].center, LatLng::new(43.8, 142.4));
        assert_eq!(result.unwrap().viewer_radius, Some(300.0));
    }

    #[test]
    fn test_viewer_radius_250_for_results_view() {
        let page = MemorySource::results_page(2, 2);
        let (_, backend) = render(&page);
        let circles = backend.circles();
        assert_eq!(circles.len(), 1);
        assert!((circles[0].radius - 250.0).abs() < 1e-9);
        assert_eq!(circles[0].color, "red");
        assert_eq!(circles[0].fill_color, "#f03");
        assert!((circles[0].fill_opacity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_circle_drawn_before_markers() {
        let page = MemorySource::results_page(1, 1);
        let (_, backend) = render(&page);
        assert!(matches!(backend.calls[2], Call::Circle(_)));
        assert!(matches!(backend.calls[3], Call::Marker(..)));
    }

    #[test]
    fn test_popup_label_escaped() {
        let page = MemorySource::location_page("43.7", "142.3", "<script>x()</script>");
        let (result, backend) = render(&page);
        assert_eq!(
            backend.open_popup.as_deref(),
            Some("&lt;script&gt;x()&lt;/script&gt;")
        );
        assert_eq!(
            result.unwrap().open_popup.as_deref(),
            Some("<script>x()</script>")
        );
    }

    #[test]
    fn test_settings_override_applied() {
        let request = MapRequest {
            center: LatLng::new(43.7, 142.3),
            viewer: Some(LatLng::new(43.7, 142.3)),
            view: MapView::Results(SearchResultSet::default()),
        };
        let settings =
            MapSettings::with_overrides(Some(r#"{"zoom": 12, "circle": {"resultsRadius": 500}}"#))
                .unwrap();
        let mut backend = RecordingBackend::default();
        let rendered = render_map(&request, &settings, &mut backend).unwrap();
        assert_eq!(rendered.zoom, 12);
        assert_eq!(backend.calls[0], Call::SetView(request.center, 12));
        assert_eq!(rendered.viewer_radius, Some(500.0));
    }

    #[test]
    fn test_invalid_settings_create_no_map() {
        let request = MapRequest {
            center: LatLng::new(43.7, 142.3),
            viewer: None,
            view: MapView::Bare,
        };
        let settings = MapSettings {
            zoom: 30,
            ..MapSettings::default()
        };
        let mut backend = RecordingBackend::default();
        let err = render_map(&request, &settings, &mut backend).unwrap_err();
        assert!(matches!(err, MapError::InvalidSettings { .. }));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn test_backend_error_propagates() {
        let request = MapRequest {
            center: LatLng::new(43.7, 142.3),
            viewer: None,
            view: MapView::Location(LocationPoint {
                position: LatLng::new(43.7, 142.3),
                label: "Park".to_string(),
            }),
        };
        let mut backend = RecordingBackend {
            fail_on_marker: Some(0),
            ..RecordingBackend::default()
        };
        let err = render_map(&request, &MapSettings::default(), &mut backend).unwrap_err();
        assert_eq!(err, MapError::Backend("marker rejected".to_string()));
    }

    #[test]
    fn test_bare_view_has_no_markers() {
        let page = MemorySource::new()
            .attr("mapid", "latitude", "43.7")
            .attr("mapid", "longitude", "142.3");
        let (result, backend) = render(&page);
        let rendered = result.unwrap();
        assert_eq!(rendered.view, "bare");
        assert!(backend.markers().is_empty());
        assert!(rendered.open_popup.is_none());
    }
}
