//! Full page Google Maps view for browser applications written in Rust.
//!
//! The Google Maps JS API is not a Rust library, so the map is shown by injecting the API script
//! into the page, waiting for it to populate `window.google.maps` and calling its constructors
//! through `js_sys`. This crate takes care of that sequence and of everything that can go wrong
//! on the way:
//!
//! * scripts and callbacks left by a previous mount are removed before loading starts,
//! * a loading overlay is shown until the library is available,
//! * a failed script download, a loading timeout and an exception thrown by the map constructor
//!   all end up as a single [`MapLoadError`] shown in a banner above the map,
//! * unmounting at any moment stops all timers and removes the overlay.
//!
//! # Quick start
//!
//! In the browser, mount the view into an existing element:
//!
//! ```ignore
//! let view = map_view::mount_map_view("root")?;
//! // ...
//! view.unmount();
//! ```
//!
//! The lifecycle itself lives in [`MapView`], which talks to the page only through the
//! [`MapHost`] trait. On `wasm32` targets the trait is implemented by `WebHost`, any other
//! implementation (like a scripted one in tests) can drive the same logic.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod config;
pub mod error;
mod host;
pub mod loader;
mod platform;
pub mod render;
mod view;

#[cfg(test)]
pub(crate) mod tests;

pub use config::{LatLng, MapOptions, MapTypeId, MapViewConfig, MarkerOptions, Messages, API_KEY};
pub use error::{HostError, MapLoadError};
pub use host::{HostEvent, MapHost, ScriptId, TimerId};
pub use view::{MapView, Phase};

#[cfg(target_arch = "wasm32")]
pub use platform::web::{mount_map_view, mount_with_config, MountedMapView, WebHost};
