//! Stock notification sinks and headless collaborators
//!
//! The log-backed window and view let the player run without a GUI; the
//! channel and JSON sinks hand notifications to another thread or process.

use crate::player::{
    HostWindow, Notification, NotificationSink, Severity, StreamInfoView, StreamTable,
};
use crate::utils::format_clock;
use crossbeam_channel::{Sender, TrySendError};
use log::{debug, error, info, log, Level};
use std::io::Write;

/// Writes notifications to the log, level chosen by severity
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }

    fn level(severity: Severity) -> Level {
        match severity {
            Severity::Error => Level::Error,
            Severity::Warning | Severity::ClockLost | Severity::Application => Level::Warn,
            Severity::Info | Severity::Eos | Severity::Sos | Severity::Duration => Level::Info,
            Severity::State | Severity::Buffering | Severity::Unhandled => Level::Debug,
        }
    }
}

impl NotificationSink for LogSink {
    fn notify(&mut self, notification: &Notification) {
        log!(
            Self::level(notification.severity),
            "[{}] {}",
            notification.severity,
            notification.text
        );
    }
}

/// Forwards notifications over a crossbeam channel
///
/// Never blocks: on a full channel the notification is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<Notification>,
}

impl ChannelSink {
    pub fn new(sender: Sender<Notification>) -> Self {
        Self { sender }
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&mut self, notification: &Notification) {
        match self.sender.try_send(notification.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => debug!("Notification channel full, dropped: {}", n.text),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Writes one JSON object per notification
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, notification: &Notification) -> crate::utils::Result<()> {
        serde_json::to_writer(&mut self.writer, notification)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> NotificationSink for JsonLinesSink<W> {
    fn notify(&mut self, notification: &Notification) {
        if let Err(e) = self.write_line(notification) {
            error!("Could not write notification: {}", e);
        }
    }
}

/// Host window that only logs what it would display
#[derive(Debug, Default)]
pub struct LogWindow {
    title: String,
}

impl LogWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl HostWindow for LogWindow {
    fn set_duration(&mut self, seconds: Option<u64>, seekable: bool) {
        match seconds {
            Some(0) => info!("Duration unknown"),
            Some(seconds) => info!(
                "Duration {}{}",
                format_clock(seconds),
                if seekable { "" } else { " (not seekable)" }
            ),
            None => debug!("Duration cleared"),
        }
    }

    fn set_position(&mut self, seconds: u64) {
        debug!("Position {}", format_clock(seconds));
    }

    fn set_title(&mut self, title: &str) {
        if self.title != title {
            info!("Now playing: {}", title);
            self.title = title.to_string();
        }
    }
}

/// Stream-info view that logs panel updates
#[derive(Debug, Default)]
pub struct LogStreamView {
    visible: bool,
}

impl LogStreamView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Log a panel, turning its markup into plain lines
    fn show(&self, panel: &str, text: &str) {
        if !self.visible {
            return;
        }

        let plain = text
            .replace("<br>", "\n")
            .replace("<b>", "* ")
            .replace("</b>", "");
        info!("{}:\n{}", panel, plain.trim_end());
    }
}

impl StreamInfoView for LogStreamView {
    fn update_audio(&mut self, text: &str) {
        self.show("Audio", text);
    }

    fn update_video(&mut self, text: &str) {
        self.show("Video", text);
    }

    fn update_subtitle(&mut self, text: &str) {
        self.show("Subtitles", text);
    }

    fn set_track_selectors(&mut self, table: &StreamTable) {
        for (key, value) in table.iter() {
            debug!("{} = {}", key, value);
        }
    }

    fn set_subtitle_enabled(&mut self, enabled: bool) {
        debug!("Subtitle panel {}", if enabled { "enabled" } else { "disabled" });
    }

    fn enable_all(&mut self, enabled: bool) {
        debug!("Stream information {}", if enabled { "enabled" } else { "disabled" });
    }

    fn toggle_visible(&mut self) {
        self.visible = !self.visible;
        info!("Stream information {}", if self.visible { "shown" } else { "hidden" });
    }
}
