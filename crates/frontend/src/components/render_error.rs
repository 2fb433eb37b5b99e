use dioxus::prelude::*;

#[component]
pub fn RenderError(message: String) -> Element {
    rsx! {
        div { class: "map-error", role: "alert",
            p { "The map could not be displayed." }
            p { class: "map-error-detail", "{message}" }
        }
    }
}
