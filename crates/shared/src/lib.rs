pub mod attrs;
pub mod error;
pub mod models;
pub mod render;
pub mod settings;

pub use error::{MapError, Result};
pub use render::{render_map, render_page, MapBackend, RenderedMap};
