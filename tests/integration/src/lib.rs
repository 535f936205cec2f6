//! Integration test utilities for MBMP
//!
//! This module provides common utilities for integration testing including:
//! - Recording implementations of the player collaborators
//! - mockall mocks of the collaborator traits
//! - A fixture wiring a scripted engine to a player

use mbmp::engine::fake::FakeEngine;
use mbmp::engine::{BusMessage, MediaEngine, PipelineState, TrackKind, TrackTags};
use mbmp::player::{
    HostWindow, Notification, NotificationSink, PlayerInterface, Severity, StreamInfoView,
    StreamTable,
};
use mockall::mock;
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything the collaborators were asked to do, in order
#[derive(Debug, Default, Clone)]
pub struct Recording {
    pub notifications: Vec<Notification>,
    pub audio: Vec<String>,
    pub video: Vec<String>,
    pub subtitle: Vec<String>,
    pub selectors: Vec<StreamTable>,
    pub subtitle_enabled: Vec<bool>,
    pub enabled: Vec<bool>,
    pub visibility_toggles: usize,
    pub durations: Vec<(Option<u64>, bool)>,
    pub positions: Vec<u64>,
    pub titles: Vec<String>,
}

impl Recording {
    /// Notifications of one severity
    pub fn of(&self, severity: Severity) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| n.severity == severity)
            .collect()
    }

    /// Texts of the notifications of one severity
    pub fn texts(&self, severity: Severity) -> Vec<String> {
        self.of(severity).into_iter().map(|n| n.text.clone()).collect()
    }
}

/// Shared handle to a recording
pub type SharedRecording = Arc<Mutex<Recording>>;

/// Sink that records notifications
pub struct RecordingSink(pub SharedRecording);

impl NotificationSink for RecordingSink {
    fn notify(&mut self, notification: &Notification) {
        self.0.lock().notifications.push(notification.clone());
    }
}

/// Host window that records display updates
pub struct RecordingWindow(pub SharedRecording);

impl HostWindow for RecordingWindow {
    fn set_duration(&mut self, seconds: Option<u64>, seekable: bool) {
        self.0.lock().durations.push((seconds, seekable));
    }

    fn set_position(&mut self, seconds: u64) {
        self.0.lock().positions.push(seconds);
    }

    fn set_title(&mut self, title: &str) {
        self.0.lock().titles.push(title.to_string());
    }
}

/// Stream-info view that records panel updates
pub struct RecordingView(pub SharedRecording);

impl StreamInfoView for RecordingView {
    fn update_audio(&mut self, text: &str) {
        self.0.lock().audio.push(text.to_string());
    }

    fn update_video(&mut self, text: &str) {
        self.0.lock().video.push(text.to_string());
    }

    fn update_subtitle(&mut self, text: &str) {
        self.0.lock().subtitle.push(text.to_string());
    }

    fn set_track_selectors(&mut self, table: &StreamTable) {
        self.0.lock().selectors.push(table.clone());
    }

    fn set_subtitle_enabled(&mut self, enabled: bool) {
        self.0.lock().subtitle_enabled.push(enabled);
    }

    fn enable_all(&mut self, enabled: bool) {
        self.0.lock().enabled.push(enabled);
    }

    fn toggle_visible(&mut self) {
        self.0.lock().visibility_toggles += 1;
    }
}

mock! {
    pub Window {}

    impl HostWindow for Window {
        fn set_duration(&mut self, seconds: Option<u64>, seekable: bool);
        fn set_position(&mut self, seconds: u64);
        fn set_title(&mut self, title: &str);
    }
}

mock! {
    pub Sink {}

    impl NotificationSink for Sink {
        fn notify(&mut self, notification: &Notification);
    }
}

/// Test fixture: a scripted engine behind a player with recording collaborators
pub struct TestFixture {
    pub engine: FakeEngine,
    pub recording: SharedRecording,
    pub player: PlayerInterface<FakeEngine>,
}

impl TestFixture {
    /// Create a fixture around a fresh engine
    pub fn new() -> Self {
        Self::with_engine(FakeEngine::new())
    }

    /// Create a fixture around a pre-scripted engine
    pub fn with_engine(engine: FakeEngine) -> Self {
        let recording = SharedRecording::default();
        let player = PlayerInterface::builder(engine.clone())
            .window(RecordingWindow(recording.clone()))
            .stream_view(RecordingView(recording.clone()))
            .sink(RecordingSink(recording.clone()))
            .build();

        Self {
            engine,
            recording,
            player,
        }
    }

    /// Copy of everything recorded so far
    pub fn recorded(&self) -> Recording {
        self.recording.lock().clone()
    }

    /// Forget everything recorded so far
    pub fn clear_recording(&self) {
        *self.recording.lock() = Recording::default();
    }

    /// Queue a state change of the top-level pipeline and force the state
    pub fn pipeline_state(&self, old: PipelineState, new: PipelineState) {
        self.engine.force_state(new);
        self.engine.push_message(BusMessage::StateChanged {
            source: self.engine.name(),
            old,
            new,
        });
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Tags of an audio track
pub fn audio_tags(codec: &str, language: &str, bitrate: u32) -> TrackTags {
    TrackTags {
        audio_codec: Some(codec.to_string()),
        language_code: Some(language.to_string()),
        bitrate: Some(bitrate),
        ..Default::default()
    }
}

/// An engine playing media with two audio tracks, one video track and one
/// untagged subtitle track
pub fn movie_engine() -> FakeEngine {
    let engine = FakeEngine::new();

    let mut main_audio = audio_tags("AAC", "en", 128000);
    main_audio.title = Some("Big Buck Bunny".to_string());
    main_audio.artist = Some("Blender Foundation".to_string());

    engine.set_tracks(
        TrackKind::Audio,
        vec![Some(main_audio), Some(audio_tags("AC-3", "de", 384000))],
        0,
    );
    engine.set_tracks(
        TrackKind::Video,
        vec![Some(TrackTags {
            video_codec: Some("H.264".to_string()),
            ..Default::default()
        })],
        0,
    );
    engine.set_tracks(TrackKind::Text, vec![None], -1);
    engine.with(|s| s.duration_ns = Some(596_000_000_000));

    engine
}
