//! Map view configuration: where to load the library from, what to show and how long to wait.

use std::time::Duration;

use serde::Serialize;

/// API key embedded into the script url.
///
/// Taken from the `GOOGLE_MAPS_API_KEY` environment variable at build time. Empty if the variable
/// was not set.
pub const API_KEY: &str = match option_env!("GOOGLE_MAPS_API_KEY") {
    Some(key) => key,
    None => "",
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(30_000);
const DEFAULT_ZOOM: u8 = 4;

/// Geographical point in the form the map library accepts it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Creates a new point.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Base map style.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTypeId {
    /// Default road map.
    #[default]
    Roadmap,
    /// Satellite imagery.
    Satellite,
    /// Satellite imagery with road overlay.
    Hybrid,
    /// Physical relief map.
    Terrain,
}

/// Options passed to the map constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapOptions {
    /// Center of the map.
    pub center: LatLng,
    /// Initial zoom level.
    pub zoom: u8,
    /// Base map style.
    pub map_type_id: MapTypeId,
}

/// Options passed to the marker constructor. The map the marker belongs to is attached by the
/// host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerOptions {
    /// Marker position.
    pub position: LatLng,
    /// Tooltip title.
    pub title: String,
}

/// User-facing texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Messages {
    /// Text of the loading overlay.
    pub loading: String,
    /// Title of the marker placed at the map center.
    pub marker_title: String,
    /// Shown when the library script could not be fetched.
    pub script_failed: String,
    /// Shown when the library did not become available before the deadline.
    pub timed_out: String,
    /// Prepended to the exception message when the map could not be constructed.
    pub init_failed_prefix: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            loading: "Loading map...".into(),
            marker_title: "My location".into(),
            script_failed:
                "Failed to load the Google Maps API. Check the network connection and the API key."
                    .into(),
            timed_out: "Loading Google Maps timed out. Refresh the page to try again.".into(),
            init_failed_prefix: "Map initialization failed: ".into(),
        }
    }
}

/// Configuration of a [`MapView`](crate::MapView).
///
/// Defaults describe the single map this crate was made for: a road map of North America with a
/// marker in the middle.
///
/// ```
/// use std::time::Duration;
/// use map_view::{LatLng, MapViewConfig};
///
/// let config = MapViewConfig::default()
///     .with_center(LatLng::new(55.75, 37.62))
///     .with_zoom(10)
///     .with_load_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct MapViewConfig {
    api_key: String,
    center: LatLng,
    zoom: u8,
    map_type: MapTypeId,
    poll_interval: Duration,
    load_timeout: Duration,
    messages: Messages,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY.to_string(),
            center: LatLng::new(40.12150192260742, -100.45039367675781),
            zoom: DEFAULT_ZOOM,
            map_type: MapTypeId::Roadmap,
            poll_interval: DEFAULT_POLL_INTERVAL,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            messages: Messages::default(),
        }
    }
}

impl MapViewConfig {
    /// Replaces the build-time [`API_KEY`].
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets the map center and the marker position.
    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = center;
        self
    }

    /// Sets the initial zoom level.
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Sets the base map style.
    pub fn with_map_type(mut self, map_type: MapTypeId) -> Self {
        self.map_type = map_type;
        self
    }

    /// Sets the period of the library readiness check.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the time after which loading is considered failed.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Replaces user-facing texts.
    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.messages = messages;
        self
    }

    /// API key sent to the provider.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Period of the readiness check.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Loading deadline.
    pub fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    /// User-facing texts.
    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Options for the map constructor.
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            center: self.center,
            zoom: self.zoom,
            map_type_id: self.map_type,
        }
    }

    /// Options for the single marker placed at the map center.
    pub fn marker_options(&self) -> MarkerOptions {
        MarkerOptions {
            position: self.center,
            title: self.messages.marker_title.clone(),
        }
    }
}
