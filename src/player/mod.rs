//! Player coordinator module for MBMP
//!
//! This module observes and steers the media pipeline. Telemetry flows one
//! way (engine bus -> poller -> dispatcher -> notification sinks) and
//! control flows the other (command -> controller -> engine). All of it
//! runs on a single task, so the stream table and the position capability
//! are never touched concurrently.

mod bus;
mod controller;
mod event_loop;
mod interface;
mod observers;
mod state;
mod stream_info;

pub use bus::describe;
pub use controller::{
    PipelineController, VisualizerRegistry, DURATION_QUERY_FAILED, POSITION_QUERY_FAILED,
    SEEK_QUERY_FAILED, STATE_QUERY_TIMEOUT, VISUALIZER_NOT_FOUND,
};
pub use event_loop::{run, PlayerCommand, POLL_INTERVAL};
pub use interface::{PlayerInterface, PlayerInterfaceBuilder};
pub use observers::{ChannelSink, JsonLinesSink, LogSink, LogStreamView, LogWindow};
pub use state::{PositionCapability, StreamKey, StreamTable};
pub use stream_info::{
    audio_info, text_info, video_info, window_title, StreamAnalyzer, AUDIO_PLACEHOLDER,
    DEFAULT_WINDOW_TITLE, SUBTITLE_PLACEHOLDER, VIDEO_PLACEHOLDER,
};

use serde::Serialize;
use std::fmt;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
    ClockLost,
    /// End of stream
    Eos,
    /// Start of stream
    Sos,
    State,
    Application,
    Buffering,
    Duration,
    Unhandled,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::ClockLost => "ClockLost",
            Severity::Eos => "EOS",
            Severity::Sos => "SOS",
            Severity::State => "State",
            Severity::Application => "Application",
            Severity::Buffering => "Buffering",
            Severity::Duration => "Duration",
            Severity::Unhandled => "Unhandled",
        };
        f.write_str(name)
    }
}

/// A (severity, text) pair sent to every notification sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub severity: Severity,
    pub text: String,
}

impl Notification {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            severity,
            text: text.into(),
        }
    }
}

/// Receiver of player notifications
///
/// Sinks are fire-and-forget: the player neither waits for nor retains
/// anything after a notification has been handed over.
pub trait NotificationSink: Send {
    /// Handle one notification
    ///
    /// # Arguments
    ///
    /// * `notification` - Severity and human readable text
    fn notify(&mut self, notification: &Notification);
}

/// The window hosting the video surface and the position controls
pub trait HostWindow: Send {
    /// Update the duration display
    ///
    /// # Arguments
    ///
    /// * `seconds` - Stream duration, `None` when there is no stream.
    ///   `Some(0)` means the duration is unknown.
    /// * `seekable` - Whether the position control may seek
    fn set_duration(&mut self, seconds: Option<u64>, seekable: bool);

    /// Update the position display
    fn set_position(&mut self, seconds: u64);

    /// Set the window title
    fn set_title(&mut self, title: &str);
}

/// Panels showing per-track stream information
pub trait StreamInfoView: Send {
    /// Replace the audio panel text
    fn update_audio(&mut self, text: &str);

    /// Replace the video panel text
    fn update_video(&mut self, text: &str);

    /// Replace the subtitle panel text
    fn update_subtitle(&mut self, text: &str);

    /// Repopulate the track selectors from a stream table snapshot
    fn set_track_selectors(&mut self, table: &StreamTable);

    /// Enable or disable the subtitle panel
    fn set_subtitle_enabled(&mut self, enabled: bool);

    /// Enable or disable the whole view
    fn enable_all(&mut self, enabled: bool);

    /// Show the view if hidden, hide it if shown
    fn toggle_visible(&mut self);
}
