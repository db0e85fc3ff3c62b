//! Scripted host with a virtual clock.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::config::{MapOptions, MarkerOptions};
use crate::error::HostError;
use crate::host::{HostEvent, MapHost, ScriptId, TimerId};
use crate::loader::{LIBRARY_NAMESPACE, PROVIDER_DOMAIN};
use crate::render::{OverlayModel, ViewModel};
use crate::MapView;

pub struct ScheduledTimer {
    pub due: u64,
    pub period: Option<u64>,
}

pub struct TestHost {
    /// Virtual time in milliseconds.
    pub now: u64,
    /// Sources of the scripts in the document head.
    pub scripts: Vec<String>,
    /// Paths of defined globals, joined with dots.
    pub globals: HashSet<String>,
    /// Time at which the library namespace appears.
    pub library_at: Option<u64>,
    /// Time at which the injected script fails to load.
    pub script_error_at: Option<u64>,
    pub mount_node: bool,
    /// Message of the exception thrown by the map constructor.
    pub map_exception: Option<String>,
    pub fail_script_injection: bool,

    pub overlays: Vec<String>,
    pub maps: Vec<MapOptions>,
    pub markers: Vec<MarkerOptions>,
    pub renders: Vec<ViewModel>,
    pub cancelled: Vec<TimerId>,
    /// Id of the last injected script.
    pub last_script: Option<ScriptId>,

    pub timers: BTreeMap<TimerId, ScheduledTimer>,
    pub intervals: HashSet<TimerId>,
    pub script_error_delivered: bool,
}

impl Default for TestHost {
    fn default() -> Self {
        Self {
            now: 0,
            scripts: vec![],
            globals: HashSet::new(),
            library_at: None,
            script_error_at: None,
            mount_node: true,
            map_exception: None,
            fail_script_injection: false,
            overlays: vec![],
            maps: vec![],
            markers: vec![],
            renders: vec![],
            cancelled: vec![],
            last_script: None,
            timers: BTreeMap::new(),
            intervals: HashSet::new(),
            script_error_delivered: false,
        }
    }
}

impl TestHost {
    pub fn with_library_at(time: u64) -> Self {
        Self {
            library_at: Some(time),
            ..Default::default()
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn cancelled_intervals(&self) -> usize {
        self.cancelled
            .iter()
            .filter(|id| self.intervals.contains(*id))
            .count()
    }

    pub fn provider_scripts(&self) -> usize {
        self.scripts
            .iter()
            .filter(|src| src.contains(PROVIDER_DOMAIN))
            .count()
    }

    pub fn last_render(&self) -> ViewModel {
        self.renders.last().cloned().expect("nothing was rendered")
    }

    fn next_event(&mut self, until: u64) -> Option<HostEvent> {
        let next_timer = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.due <= until)
            .min_by_key(|(id, timer)| (timer.due, **id))
            .map(|(id, timer)| (*id, timer.due));

        let script_error = self
            .script_error_at
            .filter(|at| *at <= until && !self.script_error_delivered)
            .zip(self.last_script)
            .filter(|_| self.provider_scripts() > 0)
            .map(|(at, script)| (at.max(self.now), script));

        match (next_timer, script_error) {
            (Some((_, due)), Some((at, script))) if at <= due => {
                self.deliver_script_error(at, script)
            }
            (None, Some((at, script))) => self.deliver_script_error(at, script),
            (Some((id, due)), _) => {
                self.now = due;
                let timer = self.timers.get_mut(&id).expect("timer disappeared");
                match timer.period {
                    Some(period) => timer.due += period,
                    None => {
                        self.timers.remove(&id);
                    }
                }
                Some(HostEvent::Timer(id))
            }
            (None, None) => None,
        }
    }

    fn deliver_script_error(&mut self, at: u64, script: ScriptId) -> Option<HostEvent> {
        self.now = at;
        self.script_error_delivered = true;
        Some(HostEvent::ScriptError(script))
    }

    fn schedule(&mut self, delay: Duration, repeat: bool) -> TimerId {
        let id = TimerId::next();
        let millis = delay.as_millis() as u64;
        self.timers.insert(
            id,
            ScheduledTimer {
                due: self.now + millis,
                period: repeat.then_some(millis),
            },
        );
        if repeat {
            self.intervals.insert(id);
        }
        id
    }
}

/// Runs the view until the virtual clock reaches `until` milliseconds.
pub fn advance(view: &mut MapView<TestHost>, until: u64) {
    while let Some(event) = view.host_mut().next_event(until) {
        view.handle_event(event);
    }

    let host = view.host_mut();
    host.now = host.now.max(until);
}

impl MapHost for TestHost {
    fn remove_scripts(&mut self, domain: &str) -> usize {
        let before = self.scripts.len();
        self.scripts.retain(|src| !src.contains(domain));
        before - self.scripts.len()
    }

    fn delete_global(&mut self, name: &str) -> bool {
        self.globals.remove(name)
    }

    fn has_global(&self, path: &[&str]) -> bool {
        let key = path.join(".");
        if self.globals.contains(&key) {
            return true;
        }

        key == LIBRARY_NAMESPACE.join(".") && self.library_at.is_some_and(|at| at <= self.now)
    }

    fn inject_script(&mut self, src: &str) -> Result<ScriptId, HostError> {
        if self.fail_script_injection {
            return Err(HostError::NotFound("document head"));
        }

        self.scripts.push(src.to_string());
        self.script_error_delivered = false;

        let id = ScriptId::next();
        self.last_script = Some(id);
        Ok(id)
    }

    fn show_overlay(&mut self, overlay: &OverlayModel) -> Result<(), HostError> {
        self.overlays.push(overlay.id.to_string());
        Ok(())
    }

    fn remove_overlay(&mut self, id: &str) -> bool {
        let before = self.overlays.len();
        self.overlays.retain(|overlay| overlay != id);
        before != self.overlays.len()
    }

    fn start_interval(&mut self, period: Duration) -> Result<TimerId, HostError> {
        Ok(self.schedule(period, true))
    }

    fn start_timeout(&mut self, delay: Duration) -> Result<TimerId, HostError> {
        Ok(self.schedule(delay, false))
    }

    fn cancel_timer(&mut self, id: TimerId) {
        self.timers.remove(&id);
        self.cancelled.push(id);
    }

    fn has_mount_node(&self) -> bool {
        self.mount_node
    }

    fn create_map(&mut self, _namespace: &[&str], options: &MapOptions) -> Result<(), HostError> {
        if let Some(message) = &self.map_exception {
            return Err(HostError::Exception(message.clone()));
        }
        if !self.mount_node {
            return Err(HostError::NotFound("mount node"));
        }

        self.maps.push(options.clone());
        Ok(())
    }

    fn create_marker(
        &mut self,
        _namespace: &[&str],
        options: &MarkerOptions,
    ) -> Result<(), HostError> {
        if self.maps.is_empty() {
            return Err(HostError::NotFound("map"));
        }

        self.markers.push(options.clone());
        Ok(())
    }

    fn render(&mut self, view: &ViewModel) {
        self.renders.push(view.clone());
    }
}
