use crate::config::MapViewConfig;
use crate::error::{HostError, MapLoadError};
use crate::host::{HostEvent, MapHost};
use crate::loader::{LoadOutcome, LoadRace, ProviderLoader, RaceSignal, LIBRARY_NAMESPACE};
use crate::render::{OverlayModel, ViewModel, OVERLAY_ID};

/// Lifecycle state of a [`MapView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Not mounted yet.
    Init,
    /// Waiting for the library.
    Loading,
    /// The map and the marker are constructed.
    Ready,
    /// Loading failed.
    Failed(MapLoadError),
}

impl Phase {
    /// Returns `true` for phases that are only left by remounting.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Ready | Phase::Failed(_))
    }
}

/// Full page map.
///
/// On [`mount`](MapView::mount) the view cleans up what a previous mount could have left, shows a
/// loading overlay and starts loading the library. Then the host feeds it events with
/// [`handle_event`](MapView::handle_event) until one of these happens first:
///
/// * the library becomes available and the map with a marker is constructed,
/// * the script fails to load,
/// * the loading deadline passes,
/// * the map constructor throws.
///
/// Any failure is shown in a banner above the (empty) map. [`unmount`](MapView::unmount) stops
/// everything that is still running.
pub struct MapView<H: MapHost> {
    host: H,
    config: MapViewConfig,
    loader: ProviderLoader,
    phase: Phase,
    race: Option<LoadRace>,
    mounted: bool,
}

impl<H: MapHost> MapView<H> {
    /// Creates a new unmounted view.
    pub fn new(host: H, config: MapViewConfig) -> Self {
        let loader = ProviderLoader::new(config.api_key());
        Self {
            host,
            config,
            loader,
            phase: Phase::Init,
            race: None,
            mounted: false,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Loading error, if any.
    pub fn error(&self) -> Option<&MapLoadError> {
        match &self.phase {
            Phase::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Text of the error banner, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error()
            .map(|err| err.user_message(self.config.messages()))
    }

    /// Returns `true` between [`mount`](MapView::mount) and [`unmount`](MapView::unmount).
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// The host the view renders into.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The current view model.
    pub fn view_model(&self) -> ViewModel {
        ViewModel::new(self.error_message())
    }

    /// Starts a new lifecycle. A mounted view is unmounted first.
    pub fn mount(&mut self) {
        if self.mounted {
            self.unmount();
        }

        self.mounted = true;
        self.phase = Phase::Loading;
        self.loader.reset(&mut self.host);
        self.render();

        if let Err(err) = self.start_loading() {
            log::error!("Failed to start loading the map library: {err}");
            self.finish(LoadOutcome::Failed(MapLoadError::Initialization(
                err.to_string(),
            )));
        }
    }

    /// Stops timers and removes the loading overlay. Safe to call in any phase.
    pub fn unmount(&mut self) {
        if let Some(mut race) = self.race.take() {
            race.cancel(&mut self.host);
        }
        self.host.remove_overlay(OVERLAY_ID);
        self.mounted = false;
    }

    /// Processes an event from the host.
    pub fn handle_event(&mut self, event: HostEvent) {
        let Some(signal) = self.race.as_ref().and_then(|race| race.signal(event)) else {
            return;
        };

        match signal {
            RaceSignal::Poll => self.poll(),
            RaceSignal::ScriptError => {
                log::warn!("Map library script failed to load");
                self.finish(LoadOutcome::Failed(MapLoadError::ScriptLoadFailure));
            }
            RaceSignal::Deadline => self.deadline(),
        }
    }

    fn start_loading(&mut self) -> Result<(), HostError> {
        let overlay = OverlayModel::loading(self.config.messages().loading.as_str());
        self.host.show_overlay(&overlay)?;

        let race = self.loader.begin(
            &mut self.host,
            self.config.poll_interval(),
            self.config.load_timeout(),
        )?;
        self.race = Some(race);

        Ok(())
    }

    fn poll(&mut self) {
        if !self.loader.is_loaded(&self.host) {
            return;
        }

        self.host.remove_overlay(OVERLAY_ID);
        if !self.host.has_mount_node() {
            log::debug!("Map library is loaded, waiting for the mount node");
            return;
        }

        match self.construct() {
            Ok(()) => {
                log::info!("Map is initialized");
                self.finish(LoadOutcome::Ready);
            }
            Err(err) => {
                log::error!("Map initialization error: {err}");
                self.finish(LoadOutcome::Failed(MapLoadError::Initialization(
                    err.to_string(),
                )));
            }
        }
    }

    fn deadline(&mut self) {
        if self.loader.is_loaded(&self.host) {
            if self.host.has_mount_node() {
                // The deadline came before the next readiness check.
                self.poll();
                return;
            }

            log::warn!("Mount node did not appear before the deadline");
        } else {
            log::warn!(
                "Map library was not loaded in {:?}",
                self.config.load_timeout()
            );
        }

        self.finish(LoadOutcome::Failed(MapLoadError::LoadTimeout));
    }

    fn construct(&mut self) -> Result<(), HostError> {
        self.host
            .create_map(&LIBRARY_NAMESPACE, &self.config.map_options())?;
        self.host
            .create_marker(&LIBRARY_NAMESPACE, &self.config.marker_options())
    }

    fn finish(&mut self, outcome: LoadOutcome) {
        let settled = match &mut self.race {
            Some(race) => race.settle(&mut self.host, outcome.clone()),
            None => true,
        };

        if !settled || self.phase.is_terminal() {
            return;
        }

        self.phase = match outcome {
            LoadOutcome::Ready => Phase::Ready,
            LoadOutcome::Failed(err) => {
                self.host.remove_overlay(OVERLAY_ID);
                Phase::Failed(err)
            }
        };
        self.render();
    }

    fn render(&mut self) {
        let view = self.view_model();
        self.host.render(&view);
    }
}
