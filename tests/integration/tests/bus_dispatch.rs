//! Integration tests for bus polling and message dispatch
//!
//! These tests verify:
//! - Notifications for every polled message kind
//! - Pipeline side effects of clock loss, end of stream and buffering
//! - Stream-info refresh on state changes of the top-level pipeline
//! - Position, duration and seeking query failures

use mbmp::engine::fake::FakeEngine;
use mbmp::engine::{BusMessage, ElementReport, MediaEngine, PipelineState};
use mbmp::player::{
    PlayerInterface, PositionCapability, Severity, AUDIO_PLACEHOLDER, DURATION_QUERY_FAILED,
    POSITION_QUERY_FAILED, SUBTITLE_PLACEHOLDER, VIDEO_PLACEHOLDER,
};
use mbmp_integration_tests::{movie_engine, MockSink, MockWindow, RecordingView, TestFixture};

#[test]
fn test_idle_tick_does_nothing() {
    let mut fixture = TestFixture::new();

    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert!(recorded.notifications.is_empty());
    assert!(recorded.positions.is_empty());
    assert_eq!(fixture.engine.snapshot().position_queries, 0);
}

#[test]
fn test_position_reported_while_playing() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.with(|s| s.position_ns = Some(83_250_000_000));

    fixture.player.poll_bus();

    assert_eq!(fixture.recorded().positions, vec![83]);
    assert!(fixture.recorded().notifications.is_empty());
}

#[test]
fn test_error_leaves_pipeline_running() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.push_message(BusMessage::Error(ElementReport::new(
        "matroskademux0",
        "Internal data stream error.",
        None,
    )));

    fixture.player.poll_bus();

    let state = fixture.engine.snapshot();
    assert_eq!(state.state, PipelineState::Playing);
    assert!(state.state_requests.is_empty());

    let texts = fixture.recorded().texts(Severity::Error);
    assert_eq!(
        texts,
        vec!["ERROR from element matroskademux0: Internal data stream error.\n  Debugging information: none"]
    );
}

#[test]
fn test_warning_and_info_carry_debug_text() {
    let mut fixture = TestFixture::new();
    fixture.engine.push_message(BusMessage::Warning(ElementReport::new(
        "souphttpsrc0",
        "Connection slow",
        Some("retry 2".to_string()),
    )));
    fixture.engine.push_message(BusMessage::Info(ElementReport::new(
        "decodebin0",
        "Using fallback",
        None,
    )));

    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert!(recorded.texts(Severity::Warning)[0].ends_with("Debugging information: retry 2"));
    assert!(recorded.texts(Severity::Info)[0].ends_with("Debugging information: none"));
}

#[test]
fn test_clock_lost_restarts_playback() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.push_message(BusMessage::ClockLost);

    fixture.player.poll_bus();

    assert_eq!(
        fixture.engine.snapshot().state_requests,
        vec![PipelineState::Paused, PipelineState::Playing]
    );
    assert_eq!(fixture.recorded().of(Severity::ClockLost).len(), 1);
}

#[test]
fn test_end_of_stream_readies_pipeline() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.push_message(BusMessage::Eos);

    fixture.player.poll_bus();

    let state = fixture.engine.snapshot();
    assert_eq!(state.state_requests, vec![PipelineState::Ready]);
    assert_eq!(state.state, PipelineState::Ready);
    assert_eq!(fixture.recorded().texts(Severity::Eos), vec!["End of stream has been reached."]);
}

#[test]
fn test_buffering_gate() {
    let mut fixture = TestFixture::new();

    for (percent, expected) in [
        (0, PipelineState::Paused),
        (99, PipelineState::Paused),
        (100, PipelineState::Playing),
        (42, PipelineState::Paused),
        (120, PipelineState::Playing),
    ] {
        fixture.engine.push_message(BusMessage::Buffering { percent });
        fixture.player.poll_bus();

        assert_eq!(fixture.engine.snapshot().state_requests.last(), Some(&expected));
    }

    assert_eq!(
        fixture.recorded().texts(Severity::Buffering),
        vec!["0", "99", "100", "42", "120"]
    );
}

#[test]
fn test_messages_drained_in_order_within_one_tick() {
    let mut fixture = TestFixture::new();
    fixture.engine.push_message(BusMessage::Other {
        type_name: "Latency".to_string(),
    });
    fixture.engine.push_message(BusMessage::StreamStart);
    fixture.engine.push_message(BusMessage::Application {
        payload: Some("hello".to_string()),
    });
    fixture.engine.push_message(BusMessage::Toc { entries: 12 });

    fixture.player.poll_bus();

    let severities: Vec<_> = fixture
        .recorded()
        .notifications
        .iter()
        .map(|n| n.severity)
        .collect();
    assert_eq!(severities, vec![Severity::Sos, Severity::Application]);

    // Kinds outside the polled set stay queued
    let bus = fixture.engine.snapshot().bus;
    assert_eq!(bus.len(), 1);
    assert!(matches!(bus[0], BusMessage::Other { .. }));
}

#[test]
fn test_dispatched_unknown_message_is_unhandled() {
    let mut fixture = TestFixture::new();

    fixture.player.dispatch(BusMessage::Other {
        type_name: "Qos".to_string(),
    });

    assert_eq!(fixture.recorded().texts(Severity::Unhandled), vec!["Unhandled bus message"]);
}

#[test]
fn test_duration_changed() {
    let mut fixture = TestFixture::new();
    fixture.engine.with(|s| s.duration_ns = Some(3_725_000_000_000));
    fixture.engine.push_message(BusMessage::DurationChanged);

    fixture.player.poll_bus();

    assert_eq!(
        fixture.recorded().texts(Severity::Duration),
        vec!["New stream duration: 01:02:05"]
    );
}

#[test]
fn test_duration_failure_reports_once() {
    let mut fixture = TestFixture::new();
    fixture.engine.with(|s| s.duration_ns = None);
    fixture.engine.push_message(BusMessage::DurationChanged);

    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert_eq!(recorded.texts(Severity::Duration), vec!["New stream duration: 00:00:00"]);
    assert_eq!(recorded.texts(Severity::Application), vec![DURATION_QUERY_FAILED]);
}

#[test]
fn test_position_failure_is_reported_once() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.with(|s| s.position_ns = None);

    for _ in 0..4 {
        fixture.player.poll_bus();
    }

    let recorded = fixture.recorded();
    assert_eq!(recorded.texts(Severity::Application), vec![POSITION_QUERY_FAILED]);
    assert!(recorded.positions.is_empty());
    assert_eq!(fixture.engine.snapshot().position_queries, 1);
    assert_eq!(
        fixture.player.controller().position_capability(),
        PositionCapability::Disabled
    );
}

#[test]
fn test_stopping_re_enables_position_queries() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.with(|s| s.position_ns = None);
    fixture.player.poll_bus();

    fixture.pipeline_state(PipelineState::Playing, PipelineState::Ready);
    fixture.player.poll_bus();
    assert_eq!(
        fixture.player.controller().position_capability(),
        PositionCapability::Unknown
    );

    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.with(|s| s.position_ns = Some(5_000_000_000));
    fixture.player.poll_bus();

    assert_eq!(fixture.recorded().positions, vec![5]);
}

#[test]
fn test_pausing_keeps_position_queries_disabled() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.with(|s| s.position_ns = None);
    fixture.player.poll_bus();

    fixture.pipeline_state(PipelineState::Playing, PipelineState::Paused);
    fixture.player.poll_bus();
    fixture.pipeline_state(PipelineState::Paused, PipelineState::Playing);
    fixture.engine.with(|s| s.position_ns = Some(5_000_000_000));
    fixture.player.poll_bus();
    fixture.player.poll_bus();

    assert_eq!(
        fixture.player.controller().position_capability(),
        PositionCapability::Disabled
    );
    assert_eq!(fixture.engine.snapshot().position_queries, 1);
    assert!(fixture.recorded().positions.is_empty());
}

#[test]
fn test_playing_refreshes_stream_info() {
    let mut fixture = TestFixture::with_engine(movie_engine());
    fixture.pipeline_state(PipelineState::Paused, PipelineState::Playing);

    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert_eq!(
        recorded.texts(Severity::State),
        vec!["mbmp_player has changed state from PAUSED to PLAYING."]
    );

    assert!(recorded.audio[0].starts_with(
        "<b>Audio Stream: 0<br>Codec: AAC<br>Language: en<br>Bitrate: 128000<br><br></b>"
    ));
    assert!(recorded.audio[0].contains("Audio Stream: 1<br>Codec: AC-3"));
    assert_eq!(recorded.video, vec!["<b>Video Stream: 0<br>Codec: H.264<br><br></b>"]);
    assert_eq!(recorded.subtitle, vec!["No subtitle tags found"]);
    assert_eq!(recorded.titles, vec!["Big Buck Bunny - Blender Foundation"]);

    let table = &recorded.selectors[0];
    assert_eq!(table.get("n-audio"), Some(2));
    assert_eq!(table.get("current-audio"), Some(0));
    assert_eq!(table.get("n-video"), Some(1));
    assert_eq!(table.get("n-text"), Some(1));
    assert_eq!(table.get("current-text"), Some(-1));

    assert_eq!(recorded.subtitle_enabled, vec![false]);
    assert_eq!(recorded.enabled, vec![true]);
    assert_eq!(recorded.durations, vec![(Some(596), true)]);
    assert_eq!(fixture.player.streams(), table);
}

#[test]
fn test_sub_element_state_changes_only_notify() {
    let mut fixture = TestFixture::with_engine(movie_engine());
    fixture.engine.force_state(PipelineState::Playing);
    fixture.engine.push_message(BusMessage::StateChanged {
        source: "mbmp_player_audio_sink".to_string(),
        old: PipelineState::Paused,
        new: PipelineState::Playing,
    });

    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert_eq!(recorded.of(Severity::State).len(), 1);
    assert!(recorded.audio.is_empty());
    assert!(recorded.enabled.is_empty());
    assert!(fixture.player.streams().is_empty());
}

#[test]
fn test_paused_disables_view_only() {
    let mut fixture = TestFixture::with_engine(movie_engine());
    fixture.pipeline_state(PipelineState::Ready, PipelineState::Playing);
    fixture.player.poll_bus();
    fixture.clear_recording();

    fixture.pipeline_state(PipelineState::Playing, PipelineState::Paused);
    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert_eq!(recorded.enabled, vec![false]);
    assert!(recorded.audio.is_empty());
    assert!(recorded.durations.is_empty());
    assert!(!fixture.player.streams().is_empty());
}

#[test]
fn test_stopping_twice_is_idempotent() {
    let mut fixture = TestFixture::with_engine(movie_engine());
    fixture.pipeline_state(PipelineState::Paused, PipelineState::Playing);
    fixture.player.poll_bus();
    fixture.clear_recording();

    fixture.pipeline_state(PipelineState::Playing, PipelineState::Ready);
    fixture.player.poll_bus();
    let first_table = fixture.player.streams().clone();

    fixture.pipeline_state(PipelineState::Ready, PipelineState::Null);
    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert_eq!(recorded.audio, vec![AUDIO_PLACEHOLDER, AUDIO_PLACEHOLDER]);
    assert_eq!(recorded.video, vec![VIDEO_PLACEHOLDER, VIDEO_PLACEHOLDER]);
    assert_eq!(recorded.subtitle, vec![SUBTITLE_PLACEHOLDER, SUBTITLE_PLACEHOLDER]);
    assert_eq!(recorded.selectors[0], recorded.selectors[1]);
    assert!(recorded.selectors[0].is_empty());
    assert_eq!(recorded.enabled, vec![false, false]);
    assert_eq!(recorded.durations, vec![(None, false), (None, false)]);
    assert!(first_table.is_empty());
    assert_eq!(&first_table, fixture.player.streams());
}

#[test]
fn test_seekability_pushed_on_playing() {
    let engine = movie_engine();
    engine.with(|s| s.seekable = Some(false));
    let mut fixture = TestFixture::with_engine(engine);
    fixture.pipeline_state(PipelineState::Paused, PipelineState::Playing);

    fixture.player.poll_bus();

    assert_eq!(fixture.recorded().durations, vec![(Some(596), false)]);
}

#[test]
fn test_host_window_receives_title_and_duration() {
    let engine = movie_engine();
    engine.force_state(PipelineState::Playing);
    engine.push_message(BusMessage::StateChanged {
        source: engine.name(),
        old: PipelineState::Paused,
        new: PipelineState::Playing,
    });

    let mut window = MockWindow::new();
    window.expect_set_position().returning(|_| ());
    window
        .expect_set_title()
        .withf(|title| title == "Big Buck Bunny - Blender Foundation")
        .times(1)
        .returning(|_| ());
    window
        .expect_set_duration()
        .withf(|seconds, seekable| *seconds == Some(596) && *seekable)
        .times(1)
        .returning(|_, _| ());

    let mut player = PlayerInterface::builder(engine)
        .window(window)
        .stream_view(RecordingView(Default::default()))
        .build();

    player.poll_bus();
}

#[test]
fn test_every_sink_is_notified() {
    let engine = FakeEngine::new();
    engine.push_message(BusMessage::StreamStart);

    let mut first = MockSink::new();
    first
        .expect_notify()
        .withf(|n| n.severity == Severity::Sos && n.text == "Start of a stream has been detected.")
        .times(1)
        .returning(|_| ());
    let mut second = MockSink::new();
    second.expect_notify().times(1).returning(|_| ());

    let mut player = PlayerInterface::builder(engine).sink(first).sink(second).build();
    player.poll_bus();
}
