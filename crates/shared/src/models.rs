use serde::{Deserialize, Serialize};

pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        LatLng {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the WGS84 range.
    pub fn is_valid(&self) -> bool {
        is_valid_latitude(self.latitude) && is_valid_longitude(self.longitude)
    }
}

pub fn is_valid_latitude(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_LATITUDE
}

pub fn is_valid_longitude(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_LONGITUDE
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub position: LatLng,
    pub label: String,
}

/// Search results in rank order: index 0 holds rank 1, the best match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    results: Vec<LocationPoint>,
}

impl SearchResultSet {
    pub fn new(results: Vec<LocationPoint>) -> Self {
        SearchResultSet { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result with the given 1-based rank.
    pub fn by_rank(&self, rank: usize) -> Option<&LocationPoint> {
        rank.checked_sub(1).and_then(|i| self.results.get(i))
    }

    /// Results paired with their rank, worst match first.
    ///
    /// The map keeps the most recently opened popup, so drawing in this order
    /// leaves rank 1 on top.
    pub fn draw_order(&self) -> impl Iterator<Item = (usize, &LocationPoint)> {
        self.results
            .iter()
            .enumerate()
            .rev()
            .map(|(i, point)| (i + 1, point))
    }
}

/// What the page asks the map to show besides the background.
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    /// Just the tiles, optionally with the viewer circle.
    Bare,
    Location(LocationPoint),
    Results(SearchResultSet),
}

impl MapView {
    pub fn kind(&self) -> &'static str {
        match self {
            MapView::Bare => "bare",
            MapView::Location(_) => "location",
            MapView::Results(_) => "results",
        }
    }
}

/// Everything the renderer needs, read and validated up front.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub center: LatLng,
    pub viewer: Option<LatLng>,
    pub view: MapView,
}
