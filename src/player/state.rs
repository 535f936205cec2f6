//! Player state for MBMP
//!
//! This module holds the two pieces of state the coordinator caches
//! between ticks: the stream table and the position query capability.

use crate::engine::TrackKind;
use std::collections::BTreeMap;
use std::fmt;

/// Keys of the stream table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKey {
    NVideo,
    NAudio,
    NText,
    CurrentVideo,
    CurrentAudio,
    CurrentText,
}

impl StreamKey {
    pub const ALL: [StreamKey; 6] = [
        StreamKey::NVideo,
        StreamKey::NAudio,
        StreamKey::NText,
        StreamKey::CurrentVideo,
        StreamKey::CurrentAudio,
        StreamKey::CurrentText,
    ];

    /// Key holding the track count of a kind
    pub fn count(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Video => StreamKey::NVideo,
            TrackKind::Audio => StreamKey::NAudio,
            TrackKind::Text => StreamKey::NText,
        }
    }

    /// Key holding the current track of a kind
    pub fn current(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Video => StreamKey::CurrentVideo,
            TrackKind::Audio => StreamKey::CurrentAudio,
            TrackKind::Text => StreamKey::CurrentText,
        }
    }

    /// String form, identical to the engine property name
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKey::NVideo => "n-video",
            StreamKey::NAudio => "n-audio",
            StreamKey::NText => "n-text",
            StreamKey::CurrentVideo => "current-video",
            StreamKey::CurrentAudio => "current-audio",
            StreamKey::CurrentText => "current-text",
        }
    }

    /// Parse a string key
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached track counts and current track indices
///
/// A current index is either -1 or within `[0, n)` for its kind. The
/// table is rebuilt as a whole when playback starts and cleared when it
/// stops; the only single-entry update is an explicit track switch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamTable {
    entries: BTreeMap<StreamKey, i32>,
}

impl StreamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the count and current index of one kind
    ///
    /// Negative counts are stored as 0 and a current index outside the
    /// count is stored as -1.
    pub fn insert_kind(&mut self, kind: TrackKind, count: i32, current: i32) {
        let count = count.max(0);
        let current = if (0..count).contains(&current) { current } else { -1 };

        self.entries.insert(StreamKey::count(kind), count);
        self.entries.insert(StreamKey::current(kind), current);
    }

    /// Look up a value by its string key
    pub fn get(&self, key: &str) -> Option<i32> {
        StreamKey::parse(key).and_then(|k| self.value(k))
    }

    /// Look up a value by typed key
    pub fn value(&self, key: StreamKey) -> Option<i32> {
        self.entries.get(&key).copied()
    }

    /// Number of tracks of a kind, 0 when unknown
    pub fn count(&self, kind: TrackKind) -> i32 {
        self.value(StreamKey::count(kind)).unwrap_or(0)
    }

    /// Current track of a kind, `None` when unset or -1
    pub fn current(&self, kind: TrackKind) -> Option<i32> {
        self.value(StreamKey::current(kind)).filter(|i| *i >= 0)
    }

    /// Switch the current track of a kind
    ///
    /// # Returns
    ///
    /// `false`, leaving the table untouched, when `index` is out of range
    pub fn select(&mut self, kind: TrackKind, index: i32) -> bool {
        if !(0..self.count(kind)).contains(&index) {
            return false;
        }

        self.entries.insert(StreamKey::current(kind), index);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries as (key, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Whether position queries are worth issuing
///
/// Starts `Unknown`, becomes `Enabled` on the first successful query and
/// `Disabled` on the first failure. Once disabled, queries are skipped
/// until the pipeline settles outside playing and paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionCapability {
    #[default]
    Unknown,
    Enabled,
    Disabled,
}

impl PositionCapability {
    pub fn is_disabled(&self) -> bool {
        *self == PositionCapability::Disabled
    }

    /// Record the outcome of a query
    pub fn record(&mut self, succeeded: bool) {
        *self = match (*self, succeeded) {
            (PositionCapability::Disabled, _) => PositionCapability::Disabled,
            (_, true) => PositionCapability::Enabled,
            (_, false) => PositionCapability::Disabled,
        };
    }

    pub fn reset(&mut self) {
        *self = PositionCapability::Unknown;
    }
}
