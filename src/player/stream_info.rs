//! Stream analysis for MBMP
//!
//! Reads the track topology of the current media from the engine and turns
//! per-track tags into the rich-text panels of the stream-info view. The
//! formatters are pure; choosing the window title is a separate step fed
//! by the same audio tags.

use crate::engine::{MediaEngine, TrackKind, TrackTags};
use crate::player::state::StreamTable;
use log::debug;
use std::fmt::Write;

/// Window title used when the media carries no title tag
pub const DEFAULT_WINDOW_TITLE: &str = "MBMP Player";

/// Audio panel text while nothing is playing
pub const AUDIO_PLACEHOLDER: &str = "Audio Information";

/// Video panel text while nothing is playing
pub const VIDEO_PLACEHOLDER: &str = "Video Information";

/// Subtitle panel text while nothing is playing
pub const SUBTITLE_PLACEHOLDER: &str = "Subtitle Information";

/// Queries stream topology and per-track tags from an engine
pub struct StreamAnalyzer;

impl StreamAnalyzer {
    /// Build a fresh stream table from the engine's six track properties
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine in the playing state
    ///
    /// # Returns
    ///
    /// A complete table; current indices outside their count are stored as -1
    pub fn analyze<E: MediaEngine>(engine: &E) -> StreamTable {
        let mut table = StreamTable::new();

        for kind in TrackKind::ALL {
            let count = engine.track_count(kind);
            let current = engine.current_track(kind);
            table.insert_kind(kind, count, current);
        }

        debug!(
            "Stream analysis: {} video, {} audio, {} text",
            table.count(TrackKind::Video),
            table.count(TrackKind::Audio),
            table.count(TrackKind::Text)
        );

        table
    }

    /// Fetch the tags of every track of a kind listed in the table
    ///
    /// Entry `i` is `None` when track `i` carries no tags.
    pub fn tags<E: MediaEngine>(
        engine: &E,
        table: &StreamTable,
        kind: TrackKind,
    ) -> Vec<Option<TrackTags>> {
        (0..table.count(kind))
            .map(|index| engine.track_tags(kind, index))
            .collect()
    }
}

/// Format the audio panel
///
/// Tracks without tags are skipped. The current track is wrapped in bold.
pub fn audio_info(tracks: &[Option<TrackTags>], current: Option<i32>) -> String {
    if tracks.is_empty() {
        return "No Audio Streams Found".to_string();
    }

    let mut s = String::new();
    for (index, tags) in indexed(tracks) {
        let Some(tags) = tags else { continue };
        let bold = current == Some(index);

        if bold {
            s.push_str("<b>");
        }
        let _ = write!(s, "Audio Stream: {}<br>", index);
        if let Some(codec) = &tags.audio_codec {
            let _ = write!(s, "Codec: {}<br>", codec);
        }
        if let Some(language) = &tags.language_code {
            let _ = write!(s, "Language: {}<br>", language);
        }
        if let Some(bitrate) = tags.bitrate {
            let _ = write!(s, "Bitrate: {}<br>", bitrate);
        }
        s.push_str("<br>");
        if bold {
            s.push_str("</b>");
        }
    }

    s
}

/// Format the video panel
///
/// Tracks without tags are skipped; a missing codec reads "unknown".
pub fn video_info(tracks: &[Option<TrackTags>], current: Option<i32>) -> String {
    if tracks.is_empty() {
        return "No Video Streams Found".to_string();
    }

    let mut s = String::new();
    for (index, tags) in indexed(tracks) {
        let Some(tags) = tags else { continue };
        let bold = current == Some(index);

        if bold {
            s.push_str("<b>");
        }
        let _ = write!(
            s,
            "Video Stream: {}<br>Codec: {}<br><br>",
            index,
            tags.video_codec.as_deref().unwrap_or("unknown")
        );
        if bold {
            s.push_str("</b>");
        }
    }

    s
}

/// Format the subtitle panel
///
/// Unlike audio and video, a track without tags is reported explicitly.
pub fn text_info(tracks: &[Option<TrackTags>], current: Option<i32>) -> String {
    if tracks.is_empty() {
        return "No Subtitle Streams Found".to_string();
    }

    let mut s = String::new();
    for (index, tags) in indexed(tracks) {
        let Some(tags) = tags else {
            s.push_str("No subtitle tags found");
            continue;
        };
        let bold = current == Some(index);

        if bold {
            s.push_str("<b>");
        }
        let _ = write!(s, "Subtitle Stream: {}<br>", index);
        if let Some(language) = &tags.language_code {
            let _ = write!(s, "Language: {}<br>", language);
        }
        s.push_str("<br>");
        if bold {
            s.push_str("</b>");
        }
    }

    s
}

/// Window title from the first audio track carrying tags
///
/// "title - artist", or just the title without an artist. Falls back to
/// [`DEFAULT_WINDOW_TITLE`] when that track has no title.
pub fn window_title(audio_tracks: &[Option<TrackTags>]) -> String {
    let Some(tags) = audio_tracks.iter().flatten().next() else {
        return DEFAULT_WINDOW_TITLE.to_string();
    };

    match (non_empty(&tags.title), non_empty(&tags.artist)) {
        (Some(title), Some(artist)) => format!("{} - {}", title, artist),
        (Some(title), None) => title.to_string(),
        (None, _) => DEFAULT_WINDOW_TITLE.to_string(),
    }
}

fn indexed(tracks: &[Option<TrackTags>]) -> impl Iterator<Item = (i32, &Option<TrackTags>)> {
    (0..).zip(tracks.iter())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
