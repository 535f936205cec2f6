//! GStreamer playbin engine
//!
//! Wraps a single `playbin` element and its bus. Bus messages are popped
//! with a type filter and decoded into [`BusMessage`] values right here,
//! so nothing above this file touches `gst::Message`.

use crate::engine::{
    BusMessage, ElementReport, MediaEngine, MessageKind, PipelineState, PlayFlags, SeekFlags,
    TrackKind, TrackTags, APPLICATION_FIELD, PLAYER_NAME,
};
use crate::utils::error::{IntoPlayerError, MbmpError, Result};
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use gstreamer_video as gst_video;
use gstreamer_video::prelude::*;
use log::{debug, info, warn};
use std::time::Duration;

/// Factory klass substring identifying visualizers
const VISUALIZATION_KLASS: &str = "Visualization";

/// Playbin backed engine
#[derive(Debug)]
pub struct GstEngine {
    playbin: gst::Element,
    bus: gst::Bus,
}

impl GstEngine {
    /// Initialize GStreamer and build the playbin pipeline
    pub fn new() -> Result<Self> {
        gst::init()?;

        let playbin = gst::ElementFactory::make("playbin")
            .name(PLAYER_NAME)
            .build()?;

        let bus = playbin
            .bus()
            .ok_or_else(|| MbmpError::engine_error("playbin has no bus"))?;

        info!("Created playbin pipeline '{}' ({})", PLAYER_NAME, gst::version_string());

        Ok(Self { playbin, bus })
    }

    fn message_type(kind: MessageKind) -> Option<gst::MessageType> {
        match kind {
            MessageKind::Eos => Some(gst::MessageType::Eos),
            MessageKind::Error => Some(gst::MessageType::Error),
            MessageKind::Warning => Some(gst::MessageType::Warning),
            MessageKind::Info => Some(gst::MessageType::Info),
            MessageKind::StateChanged => Some(gst::MessageType::StateChanged),
            MessageKind::StreamStart => Some(gst::MessageType::StreamStart),
            MessageKind::Application => Some(gst::MessageType::Application),
            MessageKind::Buffering => Some(gst::MessageType::Buffering),
            MessageKind::DurationChanged => Some(gst::MessageType::DurationChanged),
            MessageKind::Toc => Some(gst::MessageType::Toc),
            MessageKind::ClockLost => Some(gst::MessageType::ClockLost),
            MessageKind::Other => None,
        }
    }

    /// Decode a bus message into its typed form
    fn decode(message: &gst::Message) -> BusMessage {
        use gst::MessageView;

        let source = message
            .src()
            .map(|s| s.name().to_string())
            .unwrap_or_default();

        match message.view() {
            MessageView::Error(err) => BusMessage::Error(ElementReport::new(
                source,
                err.error().to_string(),
                err.debug().map(|d| d.to_string()),
            )),
            MessageView::Warning(warning) => BusMessage::Warning(ElementReport::new(
                source,
                warning.error().to_string(),
                warning.debug().map(|d| d.to_string()),
            )),
            MessageView::Info(info) => BusMessage::Info(ElementReport::new(
                source,
                info.error().to_string(),
                info.debug().map(|d| d.to_string()),
            )),
            MessageView::ClockLost(_) => BusMessage::ClockLost,
            MessageView::Eos(_) => BusMessage::Eos,
            MessageView::StreamStart(_) => BusMessage::StreamStart,
            MessageView::StateChanged(changed) => BusMessage::StateChanged {
                source,
                old: changed.old().into(),
                new: changed.current().into(),
            },
            MessageView::Application(app) => BusMessage::Application {
                payload: app
                    .structure()
                    .and_then(|s| s.get::<String>(APPLICATION_FIELD).ok()),
            },
            MessageView::Buffering(buffering) => BusMessage::Buffering {
                percent: buffering.percent(),
            },
            MessageView::DurationChanged(_) => BusMessage::DurationChanged,
            MessageView::Toc(toc) => {
                let (toc, _updated) = toc.toc();
                BusMessage::Toc {
                    entries: toc.entries().len(),
                }
            }
            _ => BusMessage::Other {
                type_name: format!("{:?}", message.type_()),
            },
        }
    }

    fn tags_from(tags: &gst::TagList) -> TrackTags {
        TrackTags {
            title: tags.get::<gst::tags::Title>().map(|v| v.get().to_string()),
            artist: tags.get::<gst::tags::Artist>().map(|v| v.get().to_string()),
            audio_codec: tags.get::<gst::tags::AudioCodec>().map(|v| v.get().to_string()),
            video_codec: tags.get::<gst::tags::VideoCodec>().map(|v| v.get().to_string()),
            language_code: tags.get::<gst::tags::LanguageCode>().map(|v| v.get().to_string()),
            bitrate: tags.get::<gst::tags::Bitrate>().map(|v| v.get()),
        }
    }
}

impl From<PipelineState> for gst::State {
    fn from(state: PipelineState) -> Self {
        match state {
            PipelineState::VoidPending => gst::State::VoidPending,
            PipelineState::Null => gst::State::Null,
            PipelineState::Ready => gst::State::Ready,
            PipelineState::Paused => gst::State::Paused,
            PipelineState::Playing => gst::State::Playing,
        }
    }
}

impl From<gst::State> for PipelineState {
    fn from(state: gst::State) -> Self {
        match state {
            gst::State::Null => PipelineState::Null,
            gst::State::Ready => PipelineState::Ready,
            gst::State::Paused => PipelineState::Paused,
            gst::State::Playing => PipelineState::Playing,
            _ => PipelineState::VoidPending,
        }
    }
}

impl From<SeekFlags> for gst::SeekFlags {
    fn from(flags: SeekFlags) -> Self {
        let mut out = gst::SeekFlags::empty();
        if flags.flush {
            out |= gst::SeekFlags::FLUSH;
        }
        if flags.skip {
            out |= gst::SeekFlags::SKIP;
        }
        if flags.key_unit {
            out |= gst::SeekFlags::KEY_UNIT;
        }
        out
    }
}

impl MediaEngine for GstEngine {
    type Factory = gst::ElementFactory;
    type Element = gst::Element;

    fn name(&self) -> String {
        self.playbin.name().to_string()
    }

    fn set_state(&self, state: PipelineState) -> Result<()> {
        self.playbin.set_state(state.into())?;
        Ok(())
    }

    fn current_state(&self, timeout: Duration) -> PipelineState {
        let timeout = gst::ClockTime::from_mseconds(timeout.as_millis() as u64);
        let (_result, current, _pending) = self.playbin.state(timeout);
        current.into()
    }

    fn set_uri(&self, uri: &str) {
        self.playbin.set_property("uri", uri);
    }

    fn set_window_handle(&self, handle: usize) {
        match self.playbin.dynamic_cast_ref::<gst_video::VideoOverlay>() {
            // SAFETY: the handle belongs to a window owned by the host, which
            // outlives playback of the current URI.
            Some(overlay) => unsafe { overlay.set_window_handle(handle) },
            None => warn!("playbin does not implement the video overlay interface"),
        }
    }

    fn volume(&self) -> f64 {
        self.playbin.property::<f64>("volume")
    }

    fn set_volume(&self, volume: f64) {
        self.playbin.set_property("volume", volume);
    }

    fn is_muted(&self) -> bool {
        self.playbin.property::<bool>("mute")
    }

    fn set_muted(&self, muted: bool) {
        self.playbin.set_property("mute", muted);
    }

    fn flags(&self) -> PlayFlags {
        let value = self.playbin.property_value("flags");
        value
            .transform::<u32>()
            .ok()
            .and_then(|v| v.get::<u32>().ok())
            .map(PlayFlags::from_bits)
            .unwrap_or_default()
    }

    fn set_flags(&self, flags: PlayFlags) {
        let current = self.playbin.property_value("flags");
        let value = glib::FlagsClass::with_type(current.type_())
            .and_then(|class| class.to_value(flags.bits()));

        match value {
            Some(value) => self.playbin.set_property_from_value("flags", &value),
            None => warn!("Could not build play flags value {:#x}", flags.bits()),
        }
    }

    fn set_connection_speed(&self, kbps: u64) {
        self.playbin.set_property("connection-speed", kbps);
    }

    fn track_count(&self, kind: TrackKind) -> i32 {
        self.playbin.property::<i32>(kind.count_property())
    }

    fn current_track(&self, kind: TrackKind) -> i32 {
        self.playbin.property::<i32>(kind.current_property())
    }

    fn set_current_track(&self, kind: TrackKind, index: i32) {
        self.playbin.set_property(kind.current_property(), index);
    }

    fn track_tags(&self, kind: TrackKind, index: i32) -> Option<TrackTags> {
        self.playbin
            .emit_by_name::<Option<gst::TagList>>(kind.tags_signal(), &[&index])
            .map(|tags| Self::tags_from(&tags))
    }

    fn seek(&self, flags: SeekFlags, position_ns: u64) -> Result<()> {
        self.playbin
            .seek_simple(flags.into(), gst::ClockTime::from_nseconds(position_ns))
            .engine_err("Seek failed")
    }

    fn query_position(&self) -> Option<u64> {
        self.playbin
            .query_position::<gst::ClockTime>()
            .map(|t| t.nseconds())
    }

    fn query_duration(&self) -> Option<u64> {
        self.playbin
            .query_duration::<gst::ClockTime>()
            .map(|t| t.nseconds())
    }

    fn query_seekable(&self) -> Option<bool> {
        let mut query = gst::query::Seeking::new(gst::Format::Time);
        if self.playbin.query(&mut query) {
            let (seekable, _start, _end) = query.result();
            Some(seekable)
        } else {
            None
        }
    }

    fn has_pending_messages(&self) -> bool {
        self.bus.have_pending()
    }

    fn pop_message(&self, filter: &[MessageKind]) -> Option<BusMessage> {
        let types: Vec<gst::MessageType> = filter
            .iter()
            .filter_map(|kind| Self::message_type(*kind))
            .collect();

        self.bus.pop_filtered(&types).map(|message| Self::decode(&message))
    }

    fn post_application_message(&self, payload: &str) {
        let structure = gst::Structure::builder("Application")
            .field(APPLICATION_FIELD, payload)
            .build();
        let message = gst::message::Application::builder(structure)
            .src(&self.playbin)
            .build();

        if let Err(e) = self.playbin.post_message(message) {
            warn!("Could not post application message '{}': {}", payload, e);
        }
    }

    fn visualizer_factories(&self) -> Vec<(String, gst::ElementFactory)> {
        let features = gst::Registry::get().features_filtered(
            |feature| {
                feature
                    .downcast_ref::<gst::ElementFactory>()
                    .is_some_and(|factory| factory.klass().contains(VISUALIZATION_KLASS))
            },
            false,
        );

        let factories: Vec<_> = features
            .into_iter()
            .filter_map(|feature| feature.downcast::<gst::ElementFactory>().ok())
            .map(|factory| (factory.longname().to_string(), factory))
            .collect();

        debug!("Found {} visualization factories", factories.len());
        factories
    }

    fn create_visualizer(&self, factory: &gst::ElementFactory) -> Option<gst::Element> {
        match factory.create().build() {
            Ok(element) => Some(element),
            Err(e) => {
                warn!("Could not create visualizer {}: {}", factory.name(), e);
                None
            }
        }
    }

    fn set_visualizer(&self, element: Option<gst::Element>) {
        self.playbin.set_property("vis-plugin", element);
    }
}
