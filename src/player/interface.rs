//! Player interface for MBMP
//!
//! This module provides the PlayerInterface that ties the pipeline
//! controller to its collaborators: the host window, the stream-info view
//! and the notification sinks. It owns the stream table and reacts to
//! pipeline state changes.

use crate::engine::{MediaEngine, PlayFlags, TrackKind};
use crate::player::controller::PipelineController;
use crate::player::observers::{LogSink, LogStreamView, LogWindow};
use crate::player::state::StreamTable;
use crate::player::stream_info::{
    audio_info, text_info, video_info, window_title, StreamAnalyzer, AUDIO_PLACEHOLDER,
    SUBTITLE_PLACEHOLDER, VIDEO_PLACEHOLDER,
};
use crate::player::{HostWindow, Notification, NotificationSink, StreamInfoView};
use crate::utils::nanos_to_seconds;
use log::{debug, info};

/// Coordinator between the pipeline and the user interface
pub struct PlayerInterface<E: MediaEngine> {
    /// Pipeline controls and queries
    pub(crate) controller: PipelineController<E>,

    /// Track counts and selections of the playing media
    pub(crate) streams: StreamTable,

    pub(crate) window: Box<dyn HostWindow>,
    pub(crate) view: Box<dyn StreamInfoView>,
    pub(crate) sinks: Vec<Box<dyn NotificationSink>>,
}

/// Builder for PlayerInterface
///
/// Collaborators left unset fall back to the log-backed ones.
pub struct PlayerInterfaceBuilder<E: MediaEngine> {
    engine: E,
    window: Option<Box<dyn HostWindow>>,
    view: Option<Box<dyn StreamInfoView>>,
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl<E: MediaEngine> PlayerInterfaceBuilder<E> {
    /// Create a new builder around an engine
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            window: None,
            view: None,
            sinks: Vec::new(),
        }
    }

    /// Set the host window
    pub fn window(mut self, window: impl HostWindow + 'static) -> Self {
        self.window = Some(Box::new(window));
        self
    }

    /// Set the stream-info view
    pub fn stream_view(mut self, view: impl StreamInfoView + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }

    /// Add a notification sink
    pub fn sink(mut self, sink: impl NotificationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Build the interface
    pub fn build(self) -> PlayerInterface<E> {
        let mut sinks = self.sinks;
        if sinks.is_empty() {
            sinks.push(Box::new(LogSink::new()));
        }

        PlayerInterface {
            controller: PipelineController::new(self.engine),
            streams: StreamTable::new(),
            window: self.window.unwrap_or_else(|| Box::new(LogWindow::new())),
            view: self.view.unwrap_or_else(|| Box::new(LogStreamView::new())),
            sinks,
        }
    }
}

impl<E: MediaEngine> PlayerInterface<E> {
    /// Create a builder
    pub fn builder(engine: E) -> PlayerInterfaceBuilder<E> {
        PlayerInterfaceBuilder::new(engine)
    }

    pub fn controller(&self) -> &PipelineController<E> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PipelineController<E> {
        &mut self.controller
    }

    /// Snapshot of the stream table
    pub fn streams(&self) -> &StreamTable {
        &self.streams
    }

    /// Deliver a notification to every sink
    pub fn notify(&mut self, notification: Notification) {
        for sink in &mut self.sinks {
            sink.notify(&notification);
        }
    }

    /// Select the current track of a kind
    ///
    /// Out of range indices are ignored. Otherwise the engine switches
    /// tracks and the matching panel is refreshed.
    pub fn set_stream(&mut self, kind: TrackKind, index: i32) {
        if !self.streams.select(kind, index) {
            debug!("Ignoring {:?} track {}, out of range", kind, index);
            return;
        }

        self.controller.engine().set_current_track(kind, index);
        info!("Switched {:?} track to {}", kind, index);

        let tags = StreamAnalyzer::tags(self.controller.engine(), &self.streams, kind);
        let current = self.streams.current(kind);
        match kind {
            TrackKind::Audio => self.view.update_audio(&audio_info(&tags, current)),
            TrackKind::Video => self.view.update_video(&video_info(&tags, current)),
            TrackKind::Text => self.view.update_subtitle(&text_info(&tags, current)),
        }
    }

    /// Show or hide the stream-info view
    pub fn toggle_stream_info(&mut self) {
        self.view.toggle_visible();
    }

    /// The pipeline reached the playing state
    pub(crate) fn on_playing(&mut self) {
        let engine = self.controller.engine();
        self.streams = StreamAnalyzer::analyze(engine);

        let audio = StreamAnalyzer::tags(engine, &self.streams, TrackKind::Audio);
        let video = StreamAnalyzer::tags(engine, &self.streams, TrackKind::Video);
        let text = StreamAnalyzer::tags(engine, &self.streams, TrackKind::Text);

        self.view
            .update_audio(&audio_info(&audio, self.streams.current(TrackKind::Audio)));
        self.window.set_title(&window_title(&audio));
        self.view
            .update_video(&video_info(&video, self.streams.current(TrackKind::Video)));
        self.view
            .update_subtitle(&text_info(&text, self.streams.current(TrackKind::Text)));

        self.view.set_track_selectors(&self.streams);
        self.view
            .set_subtitle_enabled(self.controller.check_play_flag(PlayFlags::TEXT));
        self.view.enable_all(true);

        let duration = self.controller.query_duration();
        let seekable = self.controller.query_seekable();
        self.window
            .set_duration(Some(nanos_to_seconds(duration)), seekable);
    }

    /// The pipeline reached the paused state
    pub(crate) fn on_paused(&mut self) {
        self.view.enable_all(false);
    }

    /// The pipeline settled in any state other than playing or paused
    pub(crate) fn on_stopped(&mut self) {
        self.view.update_audio(AUDIO_PLACEHOLDER);
        self.view.update_video(VIDEO_PLACEHOLDER);
        self.view.update_subtitle(SUBTITLE_PLACEHOLDER);

        self.streams.clear();
        self.view.set_track_selectors(&self.streams);
        self.view.enable_all(false);
        self.window.set_duration(None, false);
        self.controller.reset_position_capability();
    }
}
