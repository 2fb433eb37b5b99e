use dioxus::prelude::*;
use shelter_map_shared::attrs::DataSource;
use shelter_map_shared::render::render_page;
use shelter_map_shared::settings::{MapSettings, PageLayout};
use shelter_map_shared::{MapError, RenderedMap};

use crate::components::render_error::RenderError;
use crate::dom::DocumentSource;
use crate::leaflet::LeafletBackend;

/// Read the server-rendered page and draw its map.
fn mount_map() -> Result<RenderedMap, MapError> {
    let source = DocumentSource::current()
        .ok_or_else(|| MapError::Backend("no document available".to_string()))?;
    let layout = PageLayout::default();
    let overrides = source.attribute(&layout.map_element, &layout.settings_key);
    let settings = MapSettings::with_overrides(overrides.as_deref())?;
    let mut backend = LeafletBackend::new(&layout.map_element);
    render_page(&source, &layout, &settings, &mut backend)
}

/// Renders nothing itself; once mounted, the host document is parsed and the
/// map is drawn into it. A failure shows a banner instead.
#[component]
pub fn ShelterMap() -> Element {
    let mut failure = use_signal(|| None::<String>);

    // Reads no signals, so it runs exactly once after the first mount.
    use_effect(move || match mount_map() {
        Ok(rendered) => {
            tracing::debug!(?rendered, "shelter map mounted");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to render shelter map");
            failure.set(Some(e.to_string()));
        }
    });

    rsx! {
        if let Some(message) = failure() {
            RenderError { message }
        }
    }
}
