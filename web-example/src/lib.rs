//! Browser application showing a single full page map.
//!
//! Build with `wasm-pack build --target web web-example` and call the exported `main` from a page
//! that contains an element with id `root`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Id of the page element the map is mounted into.
pub const ROOT_ELEMENT_ID: &str = "root";

/// Mounts the map view into the `#root` element.
///
/// Keep the returned handle alive for as long as the map is shown; freeing it unmounts the view.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn main() -> Result<map_view::MountedMapView, JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).expect("Couldn't init logger");

    log::info!("Mounting map view into #{ROOT_ELEMENT_ID}");

    Ok(map_view::mount_with_config(
        ROOT_ELEMENT_ID,
        map_view::MapViewConfig::default(),
    )?)
}
