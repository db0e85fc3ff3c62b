//! The platform seam. [`MapView`](crate::MapView) drives its lifecycle only through [`MapHost`], so
//! the same logic runs against the browser DOM and against a scripted host in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::{MapOptions, MarkerOptions};
use crate::error::HostError;
use crate::render::{OverlayModel, ViewModel};

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SCRIPT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a timer started by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Allocates a new unique id.
    pub fn next() -> Self {
        Self(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identifier of a script injected by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(u64);

impl ScriptId {
    /// Allocates a new unique id.
    pub fn next() -> Self {
        Self(NEXT_SCRIPT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Asynchronous notification delivered by the host to [`MapView::handle_event`](crate::MapView::handle_event).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// A timer started with [`MapHost::start_interval`] ticked or a timer started with
    /// [`MapHost::start_timeout`] fired.
    Timer(TimerId),
    /// The script injected with [`MapHost::inject_script`] failed to load.
    ScriptError(ScriptId),
}

/// Platform operations needed to load the map library and show the map.
///
/// Hosts deliver timer ticks and script errors asynchronously as [`HostEvent`]s. None of the
/// methods may call back into the view.
pub trait MapHost {
    /// Removes all script elements whose source contains `domain`. Returns the number of removed
    /// elements.
    fn remove_scripts(&mut self, domain: &str) -> usize;
    /// Deletes a property of the global object. Returns `true` if it existed.
    fn delete_global(&mut self, name: &str) -> bool;
    /// Returns `true` if every object along `path` exists, starting from the global object.
    fn has_global(&self, path: &[&str]) -> bool;

    /// Appends a script element with the given source to the document head. The script is
    /// loaded asynchronously; a load failure is reported as [`HostEvent::ScriptError`] with the
    /// returned id.
    fn inject_script(&mut self, src: &str) -> Result<ScriptId, HostError>;

    /// Appends the loading overlay to the document body.
    fn show_overlay(&mut self, overlay: &OverlayModel) -> Result<(), HostError>;
    /// Removes the element with the given id from the document. Returns `true` if it was present.
    fn remove_overlay(&mut self, id: &str) -> bool;

    /// Starts a repeating timer.
    fn start_interval(&mut self, period: Duration) -> Result<TimerId, HostError>;
    /// Starts a one-shot timer.
    fn start_timeout(&mut self, delay: Duration) -> Result<TimerId, HostError>;
    /// Stops a timer. Unknown or already fired ids are ignored.
    fn cancel_timer(&mut self, id: TimerId);

    /// Returns `true` if the node the map is rendered into is available.
    fn has_mount_node(&self) -> bool;
    /// Constructs the map widget inside the mount node using the constructor found at
    /// `namespace.Map`.
    fn create_map(&mut self, namespace: &[&str], options: &MapOptions) -> Result<(), HostError>;
    /// Constructs a marker attached to the previously created map using the constructor found at
    /// `namespace.Marker`.
    fn create_marker(
        &mut self,
        namespace: &[&str],
        options: &MarkerOptions,
    ) -> Result<(), HostError>;

    /// Brings the rendered page in line with the view model.
    fn render(&mut self, view: &ViewModel);
}
