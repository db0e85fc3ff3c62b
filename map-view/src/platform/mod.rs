//! Implementations of [`MapHost`](crate::MapHost) for the supported platforms.

#[cfg(target_arch = "wasm32")]
pub mod web;
