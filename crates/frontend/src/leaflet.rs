//! Leaflet bindings behind [`MapBackend`].
//!
//! Expects `leaflet.js` to be loaded by the host page, which exposes the global `L`.

use shelter_map_shared::models::LatLng;
use shelter_map_shared::render::{CircleSpec, MapBackend};
use shelter_map_shared::{MapError, Result};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    type Map;

    #[wasm_bindgen(catch, js_namespace = L, js_name = map)]
    fn new_map(element_id: &str) -> std::result::Result<Map, JsValue>;

    #[wasm_bindgen(catch, method, js_name = setView)]
    fn set_view(this: &Map, center: &JsValue, zoom: f64) -> std::result::Result<Map, JsValue>;

    #[derive(Debug, Clone)]
    type Layer;

    #[wasm_bindgen(catch, js_namespace = L, js_name = tileLayer)]
    fn tile_layer(url_template: &str, options: &JsValue) -> std::result::Result<Layer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = marker)]
    fn marker(at: &JsValue) -> std::result::Result<Layer, JsValue>;

    #[wasm_bindgen(catch, js_namespace = L, js_name = circle)]
    fn circle(at: &JsValue, options: &JsValue) -> std::result::Result<Layer, JsValue>;

    #[wasm_bindgen(catch, method, js_name = addTo)]
    fn add_to(this: &Layer, map: &Map) -> std::result::Result<Layer, JsValue>;

    #[wasm_bindgen(catch, method, js_name = bindPopup)]
    fn bind_popup(this: &Layer, html: &str) -> std::result::Result<Layer, JsValue>;

    #[wasm_bindgen(catch, method, js_name = openPopup)]
    fn open_popup(this: &Layer) -> std::result::Result<Layer, JsValue>;
}

fn js_error(err: JsValue) -> MapError {
    let message = err
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{err:?}"));
    MapError::Backend(message)
}

fn lat_lng(at: LatLng) -> JsValue {
    js_sys::Array::of2(
        &JsValue::from_f64(at.latitude),
        &JsValue::from_f64(at.longitude),
    )
    .into()
}

fn js_object(value: serde_json::Value) -> Result<JsValue> {
    js_sys::JSON::parse(&value.to_string()).map_err(js_error)
}

/// A Leaflet map bound to one container element, created on `set_view`.
pub struct LeafletBackend {
    element_id: String,
    map: Option<Map>,
}

impl LeafletBackend {
    pub fn new(element_id: &str) -> Self {
        LeafletBackend {
            element_id: element_id.to_string(),
            map: None,
        }
    }

    fn map(&self) -> Result<&Map> {
        self.map
            .as_ref()
            .ok_or_else(|| MapError::Backend("map view not initialized".to_string()))
    }
}

impl MapBackend for LeafletBackend {
    fn set_view(&mut self, center: LatLng, zoom: u8) -> Result<()> {
        let map = new_map(&self.element_id).map_err(js_error)?;
        map.set_view(&lat_lng(center), f64::from(zoom))
            .map_err(js_error)?;
        self.map = Some(map);
        Ok(())
    }

    fn add_tile_layer(&mut self, url_template: &str, attribution: &str) -> Result<()> {
        let map = self.map()?;
        let options = js_object(serde_json::json!({ "attribution": attribution }))?;
        tile_layer(url_template, &options)
            .and_then(|layer| layer.add_to(map))
            .map_err(js_error)?;
        Ok(())
    }

    fn add_marker(&mut self, position: LatLng, popup_html: &str) -> Result<()> {
        let map = self.map()?;
        marker(&lat_lng(position))
            .and_then(|m| m.add_to(map))
            .and_then(|m| m.bind_popup(popup_html))
            .and_then(|m| m.open_popup())
            .map_err(js_error)?;
        Ok(())
    }

    fn add_circle(&mut self, spec: &CircleSpec) -> Result<()> {
        let map = self.map()?;
        let options = js_object(serde_json::json!({
            "color": spec.color,
            "fillColor": spec.fill_color,
            "fillOpacity": spec.fill_opacity,
            "radius": spec.radius,
        }))?;
        circle(&lat_lng(spec.center), &options)
            .and_then(|c| c.add_to(map))
            .map_err(js_error)?;
        Ok(())
    }
}
