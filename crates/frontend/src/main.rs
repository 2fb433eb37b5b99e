mod components;
mod dom;
mod leaflet;
mod pages;

use dioxus::prelude::*;

const CSS: Asset = asset!("/assets/main.css");

#[allow(non_snake_case)]
fn App() -> Element {
    rsx! {
        document::Stylesheet { href: CSS }
        pages::shelter_map::ShelterMap {}
    }
}

fn main() {
    dioxus::logger::initialize_default();
    launch(App);
}
