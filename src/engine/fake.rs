//! In-memory engine for tests
//!
//! State changes complete immediately, queries answer from scripted values
//! and the bus is a plain queue. Tests script the engine through
//! [`FakeEngine::with`] and inspect it through [`FakeEngine::snapshot`].
//! Clones share the same state, so a test can keep a handle on an engine
//! it has moved into a controller.

use crate::engine::{
    BusMessage, MediaEngine, MessageKind, PipelineState, PlayFlags, SeekFlags, TrackKind,
    TrackTags, PLAYER_NAME,
};
use crate::utils::error::{MbmpError, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Scriptable engine state
#[derive(Debug, Clone)]
pub struct FakeState {
    pub name: String,
    pub state: PipelineState,
    /// Every state requested, in order
    pub state_requests: Vec<PipelineState>,
    /// Refuse state requests outright
    pub refuse_state_changes: bool,
    /// Post a state-changed message for every accepted request
    pub post_state_changes: bool,
    pub uri: Option<String>,
    pub window_handle: Option<usize>,
    pub volume: f64,
    pub muted: bool,
    pub flags: PlayFlags,
    pub connection_speed: u64,
    /// Per-kind tracks, `None` entries carry no tags
    pub tracks: BTreeMap<TrackKind, Vec<Option<TrackTags>>>,
    pub current: BTreeMap<TrackKind, i32>,
    pub position_ns: Option<u64>,
    pub duration_ns: Option<u64>,
    pub seekable: Option<bool>,
    pub seeks: Vec<(SeekFlags, u64)>,
    pub position_queries: usize,
    pub duration_queries: usize,
    pub seeking_queries: usize,
    pub bus: VecDeque<BusMessage>,
    pub visualizers: Vec<String>,
    /// Whether visualizer factories manage to create elements
    pub visualizers_creatable: bool,
    pub active_visualizer: Option<String>,
    pub visualizer_installs: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            name: PLAYER_NAME.to_string(),
            state: PipelineState::Null,
            state_requests: Vec::new(),
            refuse_state_changes: false,
            post_state_changes: false,
            uri: None,
            window_handle: None,
            volume: 1.0,
            muted: false,
            flags: PlayFlags::VIDEO | PlayFlags::AUDIO | PlayFlags::SOFT_VOLUME,
            connection_speed: 0,
            tracks: BTreeMap::new(),
            current: BTreeMap::new(),
            position_ns: Some(0),
            duration_ns: Some(0),
            seekable: Some(true),
            seeks: Vec::new(),
            position_queries: 0,
            duration_queries: 0,
            seeking_queries: 0,
            bus: VecDeque::new(),
            visualizers: Vec::new(),
            visualizers_creatable: true,
            active_visualizer: None,
            visualizer_installs: 0,
        }
    }
}

/// Scriptable in-memory engine
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the scripted state
    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> FakeState {
        self.inner.lock().clone()
    }

    /// Queue a message on the bus
    pub fn push_message(&self, message: BusMessage) {
        self.inner.lock().bus.push_back(message);
    }

    /// Script the tracks of one kind and the current selection
    pub fn set_tracks(&self, kind: TrackKind, tracks: Vec<Option<TrackTags>>, current: i32) {
        let mut state = self.inner.lock();
        state.tracks.insert(kind, tracks);
        state.current.insert(kind, current);
    }

    /// Force the pipeline state without recording a request
    pub fn force_state(&self, state: PipelineState) {
        self.inner.lock().state = state;
    }
}

impl MediaEngine for FakeEngine {
    type Factory = String;
    type Element = String;

    fn name(&self) -> String {
        self.inner.lock().name.clone()
    }

    fn set_state(&self, new: PipelineState) -> Result<()> {
        let mut state = self.inner.lock();
        state.state_requests.push(new);

        if state.refuse_state_changes {
            return Err(MbmpError::engine_error(format!("refused change to {}", new)));
        }

        let old = state.state;
        state.state = new;

        if state.post_state_changes && old != new {
            let source = state.name.clone();
            state.bus.push_back(BusMessage::StateChanged { source, old, new });
        }

        Ok(())
    }

    fn current_state(&self, _timeout: Duration) -> PipelineState {
        self.inner.lock().state
    }

    fn set_uri(&self, uri: &str) {
        self.inner.lock().uri = Some(uri.to_string());
    }

    fn set_window_handle(&self, handle: usize) {
        self.inner.lock().window_handle = Some(handle);
    }

    fn volume(&self) -> f64 {
        self.inner.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.inner.lock().volume = volume;
    }

    fn is_muted(&self) -> bool {
        self.inner.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        self.inner.lock().muted = muted;
    }

    fn flags(&self) -> PlayFlags {
        self.inner.lock().flags
    }

    fn set_flags(&self, flags: PlayFlags) {
        self.inner.lock().flags = flags;
    }

    fn set_connection_speed(&self, kbps: u64) {
        self.inner.lock().connection_speed = kbps;
    }

    fn track_count(&self, kind: TrackKind) -> i32 {
        self.inner.lock().tracks.get(&kind).map_or(0, |t| t.len() as i32)
    }

    fn current_track(&self, kind: TrackKind) -> i32 {
        self.inner.lock().current.get(&kind).copied().unwrap_or(-1)
    }

    fn set_current_track(&self, kind: TrackKind, index: i32) {
        self.inner.lock().current.insert(kind, index);
    }

    fn track_tags(&self, kind: TrackKind, index: i32) -> Option<TrackTags> {
        let state = self.inner.lock();
        let tracks = state.tracks.get(&kind)?;
        usize::try_from(index).ok().and_then(|i| tracks.get(i)).cloned().flatten()
    }

    fn seek(&self, flags: SeekFlags, position_ns: u64) -> Result<()> {
        self.inner.lock().seeks.push((flags, position_ns));
        Ok(())
    }

    fn query_position(&self) -> Option<u64> {
        let mut state = self.inner.lock();
        state.position_queries += 1;
        state.position_ns
    }

    fn query_duration(&self) -> Option<u64> {
        let mut state = self.inner.lock();
        state.duration_queries += 1;
        state.duration_ns
    }

    fn query_seekable(&self) -> Option<bool> {
        let mut state = self.inner.lock();
        state.seeking_queries += 1;
        state.seekable
    }

    fn has_pending_messages(&self) -> bool {
        !self.inner.lock().bus.is_empty()
    }

    fn pop_message(&self, filter: &[MessageKind]) -> Option<BusMessage> {
        let mut state = self.inner.lock();
        let index = state.bus.iter().position(|m| m.matches(filter))?;
        state.bus.remove(index)
    }

    fn post_application_message(&self, payload: &str) {
        self.inner.lock().bus.push_back(BusMessage::Application {
            payload: Some(payload.to_string()),
        });
    }

    fn visualizer_factories(&self) -> Vec<(String, String)> {
        self.inner
            .lock()
            .visualizers
            .iter()
            .map(|name| (name.clone(), name.clone()))
            .collect()
    }

    fn create_visualizer(&self, factory: &String) -> Option<String> {
        self.inner.lock().visualizers_creatable.then(|| factory.clone())
    }

    fn set_visualizer(&self, element: Option<String>) {
        let mut state = self.inner.lock();
        state.active_visualizer = element;
        state.visualizer_installs += 1;
    }
}
