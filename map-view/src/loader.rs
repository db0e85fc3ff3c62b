//! Loading of the Google Maps library.
//!
//! The library is a script that populates `window.google.maps` when it is evaluated. It gives no
//! completion signal without a global callback, so readiness is detected by checking the
//! namespace on a timer. [`ProviderLoader`] owns everything the library leaves in the global
//! scope, and [`LoadRace`] combines the readiness check, the script error and the deadline into a
//! single operation with one result.

use std::time::Duration;

use crate::error::{HostError, MapLoadError};
use crate::host::{HostEvent, MapHost, ScriptId, TimerId};

/// Domain all library scripts are loaded from.
pub const PROVIDER_DOMAIN: &str = "maps.googleapis.com";
/// Global namespace populated by the library.
pub const LIBRARY_NAMESPACE: [&str; 2] = ["google", "maps"];
/// Global callback that earlier callback-based loaders registered.
pub const GLOBAL_HOOK: &str = "initMap";

const SCRIPT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/js";

/// What [`ProviderLoader::reset`] has cleaned up.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    /// Number of removed library scripts.
    pub removed_scripts: usize,
    /// Whether the global hook existed.
    pub hook_deleted: bool,
}

/// Owner of the library's global state.
#[derive(Debug, Clone)]
pub struct ProviderLoader {
    api_key: String,
}

impl ProviderLoader {
    /// Creates a loader using the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Url of the library entry point.
    pub fn script_url(&self) -> String {
        format!("{SCRIPT_ENDPOINT}?key={}", self.api_key)
    }

    /// Removes library scripts left by a previous mount and the stale global hook.
    pub fn reset(&self, host: &mut impl MapHost) -> ResetReport {
        let report = ResetReport {
            removed_scripts: host.remove_scripts(PROVIDER_DOMAIN),
            hook_deleted: host.delete_global(GLOBAL_HOOK),
        };

        if report != ResetReport::default() {
            log::debug!("Removed stale map library state: {report:?}");
        }

        report
    }

    /// Returns `true` if the library namespace is populated.
    pub fn is_loaded(&self, host: &impl MapHost) -> bool {
        host.has_global(&LIBRARY_NAMESPACE)
    }

    /// Starts the readiness check, injects the library script and starts the deadline timer.
    ///
    /// If the script cannot be injected, the readiness timer is stopped before returning the
    /// error.
    pub fn begin(
        &self,
        host: &mut impl MapHost,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<LoadRace, HostError> {
        let poll = host.start_interval(poll_interval)?;

        let url = self.script_url();
        let script = match host.inject_script(&url) {
            Ok(id) => id,
            Err(err) => {
                host.cancel_timer(poll);
                return Err(err);
            }
        };

        let deadline = match host.start_timeout(timeout) {
            Ok(id) => id,
            Err(err) => {
                host.cancel_timer(poll);
                return Err(err);
            }
        };

        log::info!("Loading map library from {PROVIDER_DOMAIN}");

        Ok(LoadRace {
            script,
            poll: Some(poll),
            deadline: Some(deadline),
            outcome: None,
        })
    }
}

/// Terminal result of a [`LoadRace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The map is constructed.
    Ready,
    /// Loading failed.
    Failed(MapLoadError),
}

/// Meaning of a [`HostEvent`] for a pending race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceSignal {
    /// Time to check the library namespace.
    Poll,
    /// The script failed to load.
    ScriptError,
    /// The loading deadline passed.
    Deadline,
}

/// Pending library load.
///
/// The first call to [`LoadRace::settle`] stops both timers and fixes the outcome. After that the
/// race ignores all events.
#[derive(Debug)]
pub struct LoadRace {
    script: ScriptId,
    poll: Option<TimerId>,
    deadline: Option<TimerId>,
    outcome: Option<LoadOutcome>,
}

impl LoadRace {
    /// Maps a host event to a signal. Returns `None` for events of settled races and for timers
    /// and scripts that belong to other races.
    pub fn signal(&self, event: HostEvent) -> Option<RaceSignal> {
        if self.outcome.is_some() {
            return None;
        }

        match event {
            HostEvent::ScriptError(id) if id == self.script => Some(RaceSignal::ScriptError),
            HostEvent::ScriptError(_) => None,
            HostEvent::Timer(id) if Some(id) == self.poll => Some(RaceSignal::Poll),
            HostEvent::Timer(id) if Some(id) == self.deadline => Some(RaceSignal::Deadline),
            HostEvent::Timer(_) => None,
        }
    }

    /// Fixes the outcome of the race. Returns `false` if the race was already settled.
    pub fn settle(&mut self, host: &mut impl MapHost, outcome: LoadOutcome) -> bool {
        if self.outcome.is_some() {
            log::debug!("Load race is already settled, dropping {outcome:?}");
            return false;
        }

        self.stop_timers(host);
        self.outcome = Some(outcome);
        true
    }

    /// Stops both timers without settling the race.
    pub fn cancel(&mut self, host: &mut impl MapHost) {
        self.stop_timers(host);
    }

    /// Id of the injected library script.
    pub fn script(&self) -> ScriptId {
        self.script
    }

    /// Outcome, if the race is settled.
    pub fn outcome(&self) -> Option<&LoadOutcome> {
        self.outcome.as_ref()
    }

    /// Returns `true` if any of the timers is still running.
    pub fn has_timers(&self) -> bool {
        self.poll.is_some() || self.deadline.is_some()
    }

    fn stop_timers(&mut self, host: &mut impl MapHost) {
        if let Some(id) = self.poll.take() {
            host.cancel_timer(id);
        }
        if let Some(id) = self.deadline.take() {
            host.cancel_timer(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::tests::TestHost;

    fn begin(host: &mut TestHost) -> LoadRace {
        ProviderLoader::new("KEY")
            .begin(host, Duration::from_millis(100), Duration::from_secs(30))
            .expect("failed to begin")
    }

    #[test]
    fn script_url_contains_key() {
        assert_eq!(
            ProviderLoader::new("abc").script_url(),
            "https://maps.googleapis.com/maps/api/js?key=abc"
        );
    }

    #[test]
    fn reset_removes_only_provider_scripts() {
        let mut host = TestHost::default();
        host.scripts = vec![
            "https://maps.googleapis.com/maps/api/js?key=old".into(),
            "/app.js".into(),
            "https://maps.googleapis.com/maps-api-v3/api/js/main.js".into(),
        ];
        host.globals.insert(GLOBAL_HOOK.to_string());

        let report = ProviderLoader::new("KEY").reset(&mut host);

        assert_eq!(
            report,
            ResetReport {
                removed_scripts: 2,
                hook_deleted: true
            }
        );
        assert_eq!(host.scripts, vec!["/app.js".to_string()]);
        assert!(!host.globals.contains(GLOBAL_HOOK));

        assert_eq!(
            ProviderLoader::new("KEY").reset(&mut host),
            ResetReport::default()
        );
    }

    #[test]
    fn begin_injects_script_and_starts_timers() {
        let mut host = TestHost::default();
        let race = begin(&mut host);

        assert_eq!(
            host.scripts,
            vec!["https://maps.googleapis.com/maps/api/js?key=KEY".to_string()]
        );
        assert_eq!(host.pending_timers(), 2);
        assert!(race.has_timers());
        assert!(race.outcome().is_none());
    }

    #[test]
    fn failed_injection_stops_poll_timer() {
        let mut host = TestHost {
            fail_script_injection: true,
            ..Default::default()
        };

        let result = ProviderLoader::new("KEY").begin(
            &mut host,
            Duration::from_millis(100),
            Duration::from_secs(30),
        );

        assert_matches!(result, Err(HostError::NotFound(_)));
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn race_is_settled_once() {
        let mut host = TestHost::default();
        let mut race = begin(&mut host);

        assert!(race.settle(&mut host, LoadOutcome::Ready));
        assert!(!race.settle(
            &mut host,
            LoadOutcome::Failed(MapLoadError::ScriptLoadFailure)
        ));

        assert_eq!(race.outcome(), Some(&LoadOutcome::Ready));
        assert!(!race.has_timers());
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.cancelled.len(), 2);
    }

    #[test]
    fn settled_race_ignores_events() {
        let mut host = TestHost::default();
        let mut race = begin(&mut host);
        let error = HostEvent::ScriptError(race.script());
        assert_eq!(race.signal(error), Some(RaceSignal::ScriptError));

        race.settle(&mut host, LoadOutcome::Ready);

        assert_eq!(race.signal(error), None);
    }

    #[test]
    fn errors_of_other_scripts_are_ignored() {
        let mut host = TestHost::default();
        let previous = begin(&mut host);
        let race = begin(&mut host);

        assert_ne!(previous.script(), race.script());
        assert_eq!(race.signal(HostEvent::ScriptError(previous.script())), None);
        assert_eq!(
            race.signal(HostEvent::ScriptError(race.script())),
            Some(RaceSignal::ScriptError)
        );
    }

    #[test]
    fn unknown_timers_are_ignored() {
        let mut host = TestHost::default();
        let race = begin(&mut host);

        assert_eq!(race.signal(HostEvent::Timer(TimerId::next())), None);
    }

    #[test]
    fn cancel_stops_timers_without_outcome() {
        let mut host = TestHost::default();
        let mut race = begin(&mut host);

        race.cancel(&mut host);
        race.cancel(&mut host);

        assert!(race.outcome().is_none());
        assert_eq!(host.pending_timers(), 0);
        assert_eq!(host.cancelled.len(), 2);
    }
}
