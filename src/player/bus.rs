//! Bus polling and message dispatch
//!
//! Each poll tick first refreshes the position display while playing, then
//! drains every pending message of the polled kinds in FIFO order. Every
//! message produces at most one notification; a few also steer the
//! pipeline or the stream-info view.

use crate::engine::{BusMessage, MediaEngine, PipelineState, POLLED_KINDS};
use crate::player::interface::PlayerInterface;
use crate::player::{Notification, Severity};
use crate::utils::{format_clock, nanos_to_seconds};
use log::{debug, error};

/// Text of the notification for a message
///
/// Returns `None` for messages that are only logged (table of contents)
/// and for duration changes, whose text needs a fresh duration query.
pub fn describe(message: &BusMessage) -> Option<Notification> {
    let notification = match message {
        BusMessage::Error(report) => Notification::new(
            Severity::Error,
            format!(
                "ERROR from element {}: {}\n  Debugging information: {}",
                report.source,
                report.message,
                report.debug_or_none()
            ),
        ),
        BusMessage::Warning(report) => Notification::new(
            Severity::Warning,
            format!(
                "WARNING MESSAGE from element {}: {}\n  Debugging information: {}",
                report.source,
                report.message,
                report.debug_or_none()
            ),
        ),
        BusMessage::Info(report) => Notification::new(
            Severity::Info,
            format!(
                "INFORMATION MESSAGE from element {}: {}\n  Debugging information: {}",
                report.source,
                report.message,
                report.debug_or_none()
            ),
        ),
        BusMessage::ClockLost => Notification::new(
            Severity::ClockLost,
            "Pipeline clock has become unusable, trying to reset...",
        ),
        BusMessage::Eos => Notification::new(Severity::Eos, "End of stream has been reached."),
        BusMessage::StreamStart => {
            Notification::new(Severity::Sos, "Start of a stream has been detected.")
        }
        BusMessage::StateChanged { source, old, new } => Notification::new(
            Severity::State,
            format!("{} has changed state from {} to {}.", source, old, new),
        ),
        BusMessage::Application { payload } => {
            Notification::new(Severity::Application, payload.clone().unwrap_or_default())
        }
        BusMessage::Buffering { percent } => {
            Notification::new(Severity::Buffering, percent.to_string())
        }
        BusMessage::DurationChanged | BusMessage::Toc { .. } => return None,
        BusMessage::Other { .. } => {
            Notification::new(Severity::Unhandled, "Unhandled bus message")
        }
    };

    Some(notification)
}

impl<E: MediaEngine> PlayerInterface<E> {
    /// Run one poll tick
    pub fn poll_bus(&mut self) {
        if self.controller.state() == PipelineState::Playing {
            if let Some(seconds) = self.controller.query_position() {
                self.window.set_position(seconds);
            }
        }

        if !self.controller.engine().has_pending_messages() {
            return;
        }

        let mut handled = 0usize;
        while let Some(message) = self.controller.engine().pop_message(POLLED_KINDS) {
            self.dispatch(message);
            handled += 1;
        }
        debug!("Bus tick handled {} messages", handled);
    }

    /// Notify the sinks about one decoded message, then act on it
    pub fn dispatch(&mut self, message: BusMessage) {
        if let Some(notification) = describe(&message) {
            self.notify(notification);
        }

        match message {
            BusMessage::Error(report) => {
                // Pipeline is left running
                error!("{}: {}", report.source, report.message);
            }
            BusMessage::ClockLost => {
                self.controller.request_state(PipelineState::Paused);
                self.controller.request_state(PipelineState::Playing);
            }
            BusMessage::Eos => {
                self.controller.request_state(PipelineState::Ready);
            }
            BusMessage::StateChanged { source, new, .. } => {
                // Sub-element transitions are only reported
                if source != self.controller.engine().name() {
                    return;
                }
                match new {
                    PipelineState::Playing => self.on_playing(),
                    PipelineState::Paused => self.on_paused(),
                    _ => self.on_stopped(),
                }
            }
            BusMessage::Buffering { percent } => {
                if percent < 100 {
                    self.controller.request_state(PipelineState::Paused);
                } else {
                    self.controller.request_state(PipelineState::Playing);
                }
            }
            BusMessage::DurationChanged => {
                let seconds = nanos_to_seconds(self.controller.query_duration());
                self.notify(Notification::new(
                    Severity::Duration,
                    format!("New stream duration: {}", format_clock(seconds)),
                ));
            }
            BusMessage::Toc { entries } => {
                debug!("Table of contents with {} entries", entries);
            }
            _ => {}
        }
    }
}
