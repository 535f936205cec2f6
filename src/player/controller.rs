//! Pipeline controller for MBMP
//!
//! This module provides the PipelineController that owns the media engine
//! and exposes the playback controls and the best-effort queries used by
//! the bus poller. Nothing here returns an error to the caller: refused
//! requests are logged and failed queries are reported as application
//! messages on the engine's own bus.

use crate::engine::{MediaEngine, PipelineState, PlayFlags, SeekFlags};
use crate::player::state::PositionCapability;
use crate::utils::config::StartOptions;
use crate::utils::{nanos_to_seconds, seconds_to_nanos};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::time::Duration;

/// Bounded wait for a state query
pub const STATE_QUERY_TIMEOUT: Duration = Duration::from_millis(500);

/// Posted when a position query fails
pub const POSITION_QUERY_FAILED: &str = "Error: Could not query the stream position";

/// Posted when a duration query fails
pub const DURATION_QUERY_FAILED: &str = "Error: Could not query the stream duration";

/// Posted when a seeking query fails
pub const SEEK_QUERY_FAILED: &str =
    "Error: Could not determine if seek is possible - disabling seeking in the stream";

/// Posted when a visualizer name is not in the registry
pub const VISUALIZER_NOT_FOUND: &str = "Error: No visualization plugins found";

/// Visualizer factories by human readable name
#[derive(Debug, Clone)]
pub struct VisualizerRegistry<F> {
    factories: BTreeMap<String, F>,
}

impl<F> Default for VisualizerRegistry<F> {
    fn default() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }
}

impl<F> VisualizerRegistry<F> {
    /// Build the registry from (name, factory) pairs
    ///
    /// Later duplicates of a name replace earlier ones.
    pub fn from_factories(factories: impl IntoIterator<Item = (String, F)>) -> Self {
        Self {
            factories: factories.into_iter().collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&F> {
        self.factories.get(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Owner of the media engine
pub struct PipelineController<E: MediaEngine> {
    /// The playback pipeline
    engine: E,

    /// Visualizers found at startup
    visualizers: VisualizerRegistry<E::Factory>,

    /// Whether position queries are still issued
    position: PositionCapability,
}

impl<E: MediaEngine> PipelineController<E> {
    /// Take ownership of an engine and enumerate its visualizers
    pub fn new(engine: E) -> Self {
        let visualizers = VisualizerRegistry::from_factories(engine.visualizer_factories());
        info!(
            "Pipeline controller ready for '{}', {} visualizers available",
            engine.name(),
            visualizers.len()
        );

        Self {
            engine,
            visualizers,
            position: PositionCapability::default(),
        }
    }

    /// Borrow the engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Start playing a URI
    ///
    /// # Arguments
    ///
    /// * `window` - Native window to render video into, `None` lets the
    ///   engine open its own
    /// * `uri` - Media locator
    pub fn play_media(&self, window: Option<usize>, uri: &str) {
        info!("Playing {}", uri);

        self.request_state(PipelineState::Ready);
        self.engine.set_uri(uri);
        if let Some(handle) = window {
            self.engine.set_window_handle(handle);
        }
        self.request_state(PipelineState::Playing);
    }

    /// Toggle between playing and paused
    ///
    /// Any other state, transitional ones included, is left alone.
    pub fn play_pause(&self) {
        match self.state() {
            PipelineState::Playing => self.request_state(PipelineState::Paused),
            PipelineState::Paused => self.request_state(PipelineState::Playing),
            other => debug!("play/pause ignored in state {}", other),
        }
    }

    /// Stop playback, keeping the pipeline ready for the next URI
    pub fn stop(&self) {
        self.request_state(PipelineState::Ready);
    }

    /// Current pipeline state
    ///
    /// Waits at most [`STATE_QUERY_TIMEOUT`]; the returned state may be stale.
    pub fn state(&self) -> PipelineState {
        self.engine.current_state(STATE_QUERY_TIMEOUT)
    }

    pub fn volume(&self) -> f64 {
        self.engine.volume()
    }

    /// Set the linear volume
    ///
    /// The range is not checked here; callers clamp to `[0.0, 10.0]`.
    pub fn change_volume(&self, volume: f64) {
        self.engine.set_volume(volume);
    }

    pub fn toggle_mute(&self) {
        let muted = !self.engine.is_muted();
        self.engine.set_muted(muted);
        debug!("Mute {}", if muted { "on" } else { "off" });
    }

    /// Whether any bit of `flag` is set in the play flags
    pub fn check_play_flag(&self, flag: PlayFlags) -> bool {
        self.engine.flags().intersects(flag)
    }

    /// Set or clear `flag` in the play flags
    pub fn set_play_flag(&self, flag: PlayFlags, enabled: bool) {
        let mut flags = self.engine.flags();
        flags.set(flag, enabled);
        self.engine.set_flags(flags);
    }

    /// Set the connection speed hint in kbps
    pub fn change_connection_speed(&self, kbps: u64) {
        self.engine.set_connection_speed(kbps);
    }

    /// Seek to an absolute position
    ///
    /// Silently does nothing when the stream is not seekable.
    ///
    /// # Arguments
    ///
    /// * `seconds` - Target position in whole seconds
    pub fn seek_to_position(&self, seconds: u64) {
        if !self.query_seekable() {
            debug!("Seek to {}s skipped, stream is not seekable", seconds);
            return;
        }

        if let Err(e) = self.engine.seek(SeekFlags::fast(), seconds_to_nanos(seconds)) {
            warn!("Seek to {}s failed: {}", seconds, e);
        }
    }

    /// Install the visualizer registered under `name`
    ///
    /// An unknown name posts [`VISUALIZER_NOT_FOUND`] and keeps the current
    /// visualizer. A factory that fails to instantiate selects the engine
    /// default.
    pub fn change_visualizer(&self, name: &str) {
        let Some(factory) = self.visualizers.lookup(name) else {
            warn!("Unknown visualizer '{}'", name);
            self.post_error(VISUALIZER_NOT_FOUND);
            return;
        };

        let element = self.engine.create_visualizer(factory);
        if element.is_none() {
            warn!("Visualizer '{}' could not be created, using the default", name);
        }
        self.engine.set_visualizer(element);
        info!("Visualizer set to '{}'", name);
    }

    /// Names of the available visualizers, sorted
    pub fn visualizer_names(&self) -> Vec<String> {
        self.visualizers.names()
    }

    /// Apply persisted start options
    pub fn apply_start_options(&self, options: &StartOptions) {
        if options.connection_speed > 0 {
            self.change_connection_speed(options.connection_speed);
        }

        let mut flags = self.engine.flags();
        flags.set(PlayFlags::TEXT, options.start_subtitles);
        flags.set(PlayFlags::VIS, options.start_visualizer);
        flags.set(PlayFlags::BUFFERING, options.use_stream_buffering);
        flags.set(PlayFlags::DOWNLOAD, options.use_download_buffering);
        self.engine.set_flags(flags);

        debug!("Start options applied, play flags {:#x}", flags.bits());
    }

    /// Query the playback position
    ///
    /// After the first failure this returns `None` without asking the
    /// engine until [`reset_position_capability`](Self::reset_position_capability).
    ///
    /// # Returns
    ///
    /// Position in whole seconds
    pub fn query_position(&mut self) -> Option<u64> {
        if self.position.is_disabled() {
            return None;
        }

        let position = self.engine.query_position();
        self.position.record(position.is_some());

        match position {
            Some(nanos) => Some(nanos_to_seconds(nanos)),
            None => {
                warn!("Position query failed, disabling position updates");
                self.post_error(POSITION_QUERY_FAILED);
                None
            }
        }
    }

    /// Query the stream duration
    ///
    /// # Returns
    ///
    /// Duration in nanoseconds, 0 when unknown
    pub fn query_duration(&self) -> u64 {
        match self.engine.query_duration() {
            Some(nanos) => nanos,
            None => {
                warn!("Duration query failed");
                self.post_error(DURATION_QUERY_FAILED);
                0
            }
        }
    }

    /// Whether the stream can be seeked right now
    ///
    /// Always false outside the playing state. Never cached.
    pub fn query_seekable(&self) -> bool {
        if self.state() != PipelineState::Playing {
            return false;
        }

        match self.engine.query_seekable() {
            Some(seekable) => seekable,
            None => {
                warn!("Seeking query failed");
                self.post_error(SEEK_QUERY_FAILED);
                false
            }
        }
    }

    pub fn position_capability(&self) -> PositionCapability {
        self.position
    }

    /// Allow position queries again
    pub fn reset_position_capability(&mut self) {
        self.position.reset();
    }

    /// Request a state change, logging a refusal
    pub(crate) fn request_state(&self, state: PipelineState) {
        if let Err(e) = self.engine.set_state(state) {
            warn!("State change to {} refused: {}", state, e);
        }
    }

    fn post_error(&self, text: &str) {
        self.engine.post_application_message(text);
    }
}

impl<E: MediaEngine> Drop for PipelineController<E> {
    fn drop(&mut self) {
        info!("Shutting down pipeline '{}'", self.engine.name());
        self.request_state(PipelineState::Null);
    }
}
