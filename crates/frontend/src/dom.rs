use shelter_map_shared::attrs::DataSource;

/// Name of the HTML attribute backing a `dataset` key.
pub fn data_attribute(key: &str) -> String {
    format!("data-{key}")
}

/// The live page document as a [`DataSource`].
pub struct DocumentSource {
    document: web_sys::Document,
}

impl DocumentSource {
    pub fn current() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(DocumentSource { document })
    }
}

impl DataSource for DocumentSource {
    fn has_element(&self, element_id: &str) -> bool {
        self.document.get_element_by_id(element_id).is_some()
    }

    fn attribute(&self, element_id: &str, key: &str) -> Option<String> {
        self.document
            .get_element_by_id(element_id)?
            .get_attribute(&data_attribute(key))
    }
}
