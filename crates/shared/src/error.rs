use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Invalid coordinate in #{element} data-{key}: {value:?}")]
    InvalidCoordinate {
        element: String,
        key: String,
        value: String,
    },

    #[error("Invalid result count in #{element} data-{key}: {value:?}")]
    InvalidCount {
        element: String,
        key: String,
        value: String,
    },

    #[error("Missing data: #{element} data-{key}")]
    MissingData { element: String, key: String },

    #[error("Invalid map settings: {message}")]
    InvalidSettings { message: String },

    #[error("Map backend error: {0}")]
    Backend(String),
}

impl MapError {
    pub(crate) fn missing(element: &str, key: &str) -> Self {
        MapError::MissingData {
            element: element.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid_coordinate(element: &str, key: &str, value: &str) -> Self {
        MapError::InvalidCoordinate {
            element: element.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        MapError::InvalidSettings {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
