//! Media engine module for MBMP
//!
//! The player never decodes, demuxes or renders anything itself. It drives
//! a playbin-style pipeline through the narrow [`MediaEngine`] interface:
//! property reads and writes, state requests, seeks, queries and a polled
//! message bus. The GStreamer implementation lives behind the `gst`
//! feature; an in-memory engine is available for tests.

mod message;

#[cfg(feature = "gst")]
mod gst_engine;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use message::{BusMessage, ElementReport, MessageKind, POLLED_KINDS};

#[cfg(feature = "gst")]
pub use gst_engine::GstEngine;

use crate::utils::error::Result;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::time::Duration;

/// Name given to the top-level pipeline object
pub const PLAYER_NAME: &str = "mbmp_player";

/// Name of the structure field carrying application message payloads
pub const APPLICATION_FIELD: &str = "MBMP";

/// Pipeline state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// No state change pending
    VoidPending,
    Null,
    Ready,
    Paused,
    Playing,
}

impl PipelineState {
    /// Engine name of the state
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::VoidPending => "VOID_PENDING",
            PipelineState::Null => "NULL",
            PipelineState::Ready => "READY",
            PipelineState::Paused => "PAUSED",
            PipelineState::Playing => "PLAYING",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Elementary stream kinds a playbin exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

impl TrackKind {
    /// All kinds, in the order the stream table is queried
    pub const ALL: [TrackKind; 3] = [TrackKind::Video, TrackKind::Audio, TrackKind::Text];

    /// Property holding the number of tracks of this kind
    pub fn count_property(&self) -> &'static str {
        match self {
            TrackKind::Video => "n-video",
            TrackKind::Audio => "n-audio",
            TrackKind::Text => "n-text",
        }
    }

    /// Property holding the current track of this kind
    pub fn current_property(&self) -> &'static str {
        match self {
            TrackKind::Video => "current-video",
            TrackKind::Audio => "current-audio",
            TrackKind::Text => "current-text",
        }
    }

    /// Action signal returning the tags of one track
    pub fn tags_signal(&self) -> &'static str {
        match self {
            TrackKind::Video => "get-video-tags",
            TrackKind::Audio => "get-audio-tags",
            TrackKind::Text => "get-text-tags",
        }
    }
}

/// Playbin behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlayFlags(u32);

impl PlayFlags {
    pub const VIDEO: PlayFlags = PlayFlags(0x0001);
    pub const AUDIO: PlayFlags = PlayFlags(0x0002);
    pub const TEXT: PlayFlags = PlayFlags(0x0004);
    pub const VIS: PlayFlags = PlayFlags(0x0008);
    pub const SOFT_VOLUME: PlayFlags = PlayFlags(0x0010);
    pub const NATIVE_AUDIO: PlayFlags = PlayFlags(0x0020);
    pub const NATIVE_VIDEO: PlayFlags = PlayFlags(0x0040);
    pub const DOWNLOAD: PlayFlags = PlayFlags(0x0080);
    pub const BUFFERING: PlayFlags = PlayFlags(0x0100);
    pub const DEINTERLACE: PlayFlags = PlayFlags(0x0200);
    pub const SOFT_COLORBALANCE: PlayFlags = PlayFlags(0x0400);
    pub const FORCE_FILTERS: PlayFlags = PlayFlags(0x0800);

    pub const fn empty() -> Self {
        PlayFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        PlayFlags(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True when any bit of `other` is set in `self`
    pub const fn intersects(&self, other: PlayFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// Set or clear the bits of `other`
    pub fn set(&mut self, other: PlayFlags, enabled: bool) {
        if enabled {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for PlayFlags {
    type Output = PlayFlags;

    fn bitor(self, rhs: PlayFlags) -> PlayFlags {
        PlayFlags(self.0 | rhs.0)
    }
}

impl BitAnd for PlayFlags {
    type Output = PlayFlags;

    fn bitand(self, rhs: PlayFlags) -> PlayFlags {
        PlayFlags(self.0 & rhs.0)
    }
}

impl Not for PlayFlags {
    type Output = PlayFlags;

    fn not(self) -> PlayFlags {
        PlayFlags(!self.0)
    }
}

/// Seek behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekFlags {
    /// Flush the pipeline before seeking
    pub flush: bool,

    /// Allow the engine to skip frames
    pub skip: bool,

    /// Snap to the nearest keyframe
    pub key_unit: bool,
}

impl SeekFlags {
    /// Flush, skip and snap to keyframe: fast, possibly inexact seeks
    pub const fn fast() -> Self {
        Self {
            flush: true,
            skip: true,
            key_unit: true,
        }
    }
}

/// Tags the player reads from a single track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub language_code: Option<String>,
    pub bitrate: Option<u32>,
}

/// Interface to the playback engine
///
/// Implementations wrap a single playbin-style pipeline. Methods take
/// `&self` because engine objects are reference counted and internally
/// synchronised; the player still only calls them from one task.
pub trait MediaEngine {
    /// Opaque handle to a visualizer factory in the plugin registry
    type Factory: Clone;

    /// A visualizer element created from a factory
    type Element;

    /// Name of the top-level pipeline object
    fn name(&self) -> String;

    /// Request a state change
    ///
    /// Completion is asynchronous and reported on the bus; an error here
    /// only means the request was refused outright.
    fn set_state(&self, state: PipelineState) -> Result<()>;

    /// Current state, waiting at most `timeout` for a pending change
    ///
    /// Returns the current state even when the wait times out.
    fn current_state(&self, timeout: Duration) -> PipelineState;

    /// Set the media URI
    fn set_uri(&self, uri: &str);

    /// Bind the video output to a native window
    ///
    /// # Arguments
    ///
    /// * `handle` - Platform window handle (XID, HWND, NSView)
    fn set_window_handle(&self, handle: usize);

    /// Linear volume, 1.0 is 100%
    fn volume(&self) -> f64;

    /// Set the linear volume
    fn set_volume(&self, volume: f64);

    fn is_muted(&self) -> bool;

    fn set_muted(&self, muted: bool);

    /// Current play flags
    fn flags(&self) -> PlayFlags;

    /// Replace the play flags
    fn set_flags(&self, flags: PlayFlags);

    /// Set the network connection speed hint in kbps
    fn set_connection_speed(&self, kbps: u64);

    /// Number of tracks of a kind
    fn track_count(&self, kind: TrackKind) -> i32;

    /// Index of the current track of a kind, -1 when none
    fn current_track(&self, kind: TrackKind) -> i32;

    /// Select the current track of a kind
    fn set_current_track(&self, kind: TrackKind, index: i32);

    /// Tags of one track, `None` when the track carries no tags
    fn track_tags(&self, kind: TrackKind, index: i32) -> Option<TrackTags>;

    /// Seek to an absolute position
    ///
    /// # Arguments
    ///
    /// * `flags` - Seek behaviour
    /// * `position_ns` - Target position in nanoseconds
    fn seek(&self, flags: SeekFlags, position_ns: u64) -> Result<()>;

    /// Current position in nanoseconds, `None` if the query failed
    fn query_position(&self) -> Option<u64>;

    /// Duration in nanoseconds, `None` if the query failed
    fn query_duration(&self) -> Option<u64>;

    /// Whether the stream is seekable, `None` if the query failed
    fn query_seekable(&self) -> Option<bool>;

    /// True when at least one message is waiting on the bus
    fn has_pending_messages(&self) -> bool;

    /// Pop the oldest message whose kind is in `filter`
    ///
    /// Messages of other kinds are left on the bus.
    fn pop_message(&self, filter: &[MessageKind]) -> Option<BusMessage>;

    /// Post an application message on the pipeline's own bus
    fn post_application_message(&self, payload: &str);

    /// Enumerate the visualization factories in the plugin registry
    fn visualizer_factories(&self) -> Vec<(String, Self::Factory)>;

    /// Instantiate a visualizer, `None` if the factory failed
    fn create_visualizer(&self, factory: &Self::Factory) -> Option<Self::Element>;

    /// Install a visualizer, `None` selects the engine default
    fn set_visualizer(&self, element: Option<Self::Element>);
}
