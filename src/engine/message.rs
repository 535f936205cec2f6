//! Bus messages decoded at the engine boundary
//!
//! Each engine message is decoded exactly once into a [`BusMessage`]
//! variant carrying its own typed payload. Everything past the engine
//! works on these values, never on raw engine messages.

use crate::engine::PipelineState;
use std::fmt;

/// Kind of a bus message, used for filtered pops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Eos,
    Error,
    Warning,
    Info,
    StateChanged,
    StreamStart,
    Application,
    Buffering,
    DurationChanged,
    Toc,
    ClockLost,
    /// Any kind the player does not poll for
    Other,
}

/// Message kinds drained by the bus poller, everything else stays queued
pub const POLLED_KINDS: &[MessageKind] = &[
    MessageKind::Eos,
    MessageKind::Error,
    MessageKind::Warning,
    MessageKind::Info,
    MessageKind::StateChanged,
    MessageKind::StreamStart,
    MessageKind::Application,
    MessageKind::Buffering,
    MessageKind::DurationChanged,
    MessageKind::Toc,
    MessageKind::ClockLost,
];

/// Payload shared by error, warning and info messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementReport {
    /// Name of the element that posted the message
    pub source: String,

    /// Primary human readable message
    pub message: String,

    /// Optional debugging details
    pub debug: Option<String>,
}

impl ElementReport {
    pub fn new(
        source: impl Into<String>,
        message: impl Into<String>,
        debug: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            debug,
        }
    }

    /// Debug details, or the literal placeholder "none"
    pub fn debug_or_none(&self) -> &str {
        match self.debug.as_deref() {
            Some(debug) if !debug.is_empty() => debug,
            _ => "none",
        }
    }
}

/// A decoded bus message
#[derive(Debug, Clone, PartialEq)]
pub enum BusMessage {
    Error(ElementReport),
    Warning(ElementReport),
    Info(ElementReport),
    ClockLost,
    Eos,
    StreamStart,
    StateChanged {
        source: String,
        old: PipelineState,
        new: PipelineState,
    },
    /// Self-posted message, payload is the text of the `MBMP` field
    Application {
        payload: Option<String>,
    },
    Buffering {
        percent: i32,
    },
    DurationChanged,
    Toc {
        entries: usize,
    },
    /// A message outside the polled kinds
    Other {
        type_name: String,
    },
}

impl BusMessage {
    /// Kind of this message
    pub fn kind(&self) -> MessageKind {
        match self {
            BusMessage::Error(_) => MessageKind::Error,
            BusMessage::Warning(_) => MessageKind::Warning,
            BusMessage::Info(_) => MessageKind::Info,
            BusMessage::ClockLost => MessageKind::ClockLost,
            BusMessage::Eos => MessageKind::Eos,
            BusMessage::StreamStart => MessageKind::StreamStart,
            BusMessage::StateChanged { .. } => MessageKind::StateChanged,
            BusMessage::Application { .. } => MessageKind::Application,
            BusMessage::Buffering { .. } => MessageKind::Buffering,
            BusMessage::DurationChanged => MessageKind::DurationChanged,
            BusMessage::Toc { .. } => MessageKind::Toc,
            BusMessage::Other { .. } => MessageKind::Other,
        }
    }

    /// Whether this message passes the given kind filter
    pub fn matches(&self, filter: &[MessageKind]) -> bool {
        filter.contains(&self.kind())
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Eos => "eos",
            MessageKind::Error => "error",
            MessageKind::Warning => "warning",
            MessageKind::Info => "info",
            MessageKind::StateChanged => "state-changed",
            MessageKind::StreamStart => "stream-start",
            MessageKind::Application => "application",
            MessageKind::Buffering => "buffering",
            MessageKind::DurationChanged => "duration-changed",
            MessageKind::Toc => "toc",
            MessageKind::ClockLost => "clock-lost",
            MessageKind::Other => "other",
        };
        f.write_str(name)
    }
}
