//! Error types used by the crate.

use thiserror::Error;

use crate::config::Messages;

/// Reason the map could not be shown. This is the only error a user ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapLoadError {
    /// The library script could not be fetched (network, DNS, blocked by the browser).
    #[error("failed to load the map library script")]
    ScriptLoadFailure,
    /// The library did not become available before the deadline.
    #[error("map library was not loaded in time")]
    LoadTimeout,
    /// Map or marker constructor failed. Contains the exception message.
    #[error("failed to initialize the map: {0}")]
    Initialization(String),
}

impl MapLoadError {
    /// Text to show in the error banner.
    pub fn user_message(&self, messages: &Messages) -> String {
        match self {
            Self::ScriptLoadFailure => messages.script_failed.clone(),
            Self::LoadTimeout => messages.timed_out.clone(),
            Self::Initialization(details) => format!("{}{details}", messages.init_failed_prefix),
        }
    }
}

/// Failure of a platform operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Exception thrown by the JS code, with its message.
    #[error("{0}")]
    Exception(String),
    /// Error interacting with WASM runtime.
    #[error("wasm error: {0:?}")]
    Wasm(Option<String>),
    /// Required object is not available.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for HostError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        use wasm_bindgen::JsCast;

        match value.dyn_ref::<js_sys::Error>() {
            Some(error) => HostError::Exception(String::from(error.message())),
            None => match value.as_string() {
                Some(message) => HostError::Exception(message),
                None => HostError::Wasm(Some(format!("{value:?}"))),
            },
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<web_sys::Element> for HostError {
    fn from(value: web_sys::Element) -> Self {
        HostError::Wasm(Some(format!("Failed to cast {value:?} into target type")))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<serde_wasm_bindgen::Error> for HostError {
    fn from(value: serde_wasm_bindgen::Error) -> Self {
        HostError::Generic(format!("failed to convert options: {value}"))
    }
}
