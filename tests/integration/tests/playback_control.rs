//! Integration tests for playback control through player commands
//!
//! These tests drive the player the way the event loop does, through
//! `PlayerInterface::execute`, and check what reaches the engine and the
//! collaborators.

use mbmp::engine::{MediaEngine, PipelineState, PlayFlags, SeekFlags, TrackKind};
use mbmp::player::{PlayerCommand, Severity, SEEK_QUERY_FAILED, VISUALIZER_NOT_FOUND};
use mbmp_integration_tests::{movie_engine, TestFixture};

fn playing_movie() -> TestFixture {
    let mut fixture = TestFixture::with_engine(movie_engine());
    fixture.pipeline_state(PipelineState::Paused, PipelineState::Playing);
    fixture.player.poll_bus();
    fixture.clear_recording();
    fixture
}

#[test]
fn test_play_media_with_state_messages() {
    let mut fixture = TestFixture::with_engine(movie_engine());
    fixture.engine.with(|s| s.post_state_changes = true);

    fixture.player.execute(PlayerCommand::PlayMedia {
        window: Some(7),
        uri: "file:///media/bunny.mkv".to_string(),
    });
    fixture.player.poll_bus();

    let recorded = fixture.recorded();
    assert_eq!(
        recorded.texts(Severity::State),
        vec![
            "mbmp_player has changed state from NULL to READY.",
            "mbmp_player has changed state from READY to PLAYING.",
        ]
    );
    assert_eq!(fixture.player.streams().count(TrackKind::Audio), 2);
    assert_eq!(fixture.engine.snapshot().window_handle, Some(7));
}

#[test]
fn test_play_pause_round_trip() {
    let mut fixture = playing_movie();

    fixture.player.execute(PlayerCommand::PlayPause);
    assert_eq!(fixture.engine.snapshot().state, PipelineState::Paused);

    fixture.player.execute(PlayerCommand::PlayPause);
    assert_eq!(fixture.engine.snapshot().state, PipelineState::Playing);
}

#[test]
fn test_play_pause_ignored_when_stopped() {
    let mut fixture = TestFixture::new();
    fixture.engine.force_state(PipelineState::Ready);

    fixture.player.execute(PlayerCommand::PlayPause);

    let state = fixture.engine.snapshot();
    assert_eq!(state.state, PipelineState::Ready);
    assert!(state.state_requests.is_empty());
}

#[test]
fn test_seek_converts_to_nanoseconds() {
    let mut fixture = playing_movie();

    fixture.player.execute(PlayerCommand::Seek(1));
    fixture.player.execute(PlayerCommand::Seek(3600));

    assert_eq!(
        fixture.engine.snapshot().seeks,
        vec![
            (SeekFlags::fast(), 1_000_000_000),
            (SeekFlags::fast(), 3_600_000_000_000),
        ]
    );
}

#[test]
fn test_seek_query_failure_skips_seek() {
    let mut fixture = playing_movie();
    fixture.engine.with(|s| s.seekable = None);

    fixture.player.execute(PlayerCommand::Seek(30));
    fixture.player.poll_bus();

    assert!(fixture.engine.snapshot().seeks.is_empty());
    assert_eq!(fixture.recorded().texts(Severity::Application), vec![SEEK_QUERY_FAILED]);
}

#[test]
fn test_volume_mute_and_connection_speed() {
    let mut fixture = TestFixture::new();

    fixture.player.execute(PlayerCommand::SetVolume(4.5));
    fixture.player.execute(PlayerCommand::ToggleMute);
    fixture.player.execute(PlayerCommand::SetConnectionSpeed(18_446_744_073_709_551));

    let state = fixture.engine.snapshot();
    assert_eq!(state.volume, 4.5);
    assert!(state.muted);
    assert_eq!(state.connection_speed, 18_446_744_073_709_551);
    assert_eq!(fixture.player.controller().volume(), 4.5);
}

#[test]
fn test_subtitle_flag_reaches_view() {
    let mut fixture = TestFixture::with_engine(movie_engine());
    fixture.player.execute(PlayerCommand::SetPlayFlag(PlayFlags::TEXT, true));
    fixture.pipeline_state(PipelineState::Paused, PipelineState::Playing);

    fixture.player.poll_bus();

    assert!(fixture.player.controller().check_play_flag(PlayFlags::TEXT));
    assert_eq!(fixture.recorded().subtitle_enabled, vec![true]);
}

#[test]
fn test_unknown_visualizer_notifies_and_keeps_current() {
    let engine = movie_engine();
    engine.with(|s| s.visualizers = vec!["GOOM: what a GOOM!".to_string()]);
    let mut fixture = TestFixture::with_engine(engine);

    fixture
        .player
        .execute(PlayerCommand::ChangeVisualizer("GOOM: what a GOOM!".to_string()));
    fixture
        .player
        .execute(PlayerCommand::ChangeVisualizer("Milkdrop".to_string()));
    fixture.player.poll_bus();

    let state = fixture.engine.snapshot();
    assert_eq!(state.active_visualizer.as_deref(), Some("GOOM: what a GOOM!"));
    assert_eq!(state.visualizer_installs, 1);
    assert_eq!(fixture.recorded().texts(Severity::Application), vec![VISUALIZER_NOT_FOUND]);
}

#[test]
fn test_select_stream_updates_table_and_panel() {
    let mut fixture = playing_movie();

    fixture.player.execute(PlayerCommand::SelectStream(TrackKind::Audio, 1));

    assert_eq!(fixture.engine.current_track(TrackKind::Audio), 1);
    assert_eq!(fixture.player.streams().get("current-audio"), Some(1));

    let recorded = fixture.recorded();
    assert_eq!(recorded.audio.len(), 1);
    assert!(recorded.audio[0].starts_with("Audio Stream: 0<br>"));
    assert!(recorded.audio[0].contains("<b>Audio Stream: 1<br>Codec: AC-3"));
    assert!(recorded.video.is_empty());
}

#[test]
fn test_select_stream_out_of_range_is_ignored() {
    let mut fixture = playing_movie();

    fixture.player.execute(PlayerCommand::SelectStream(TrackKind::Video, 1));
    fixture.player.execute(PlayerCommand::SelectStream(TrackKind::Text, -1));

    assert_eq!(fixture.engine.current_track(TrackKind::Video), 0);
    assert_eq!(fixture.player.streams().get("current-video"), Some(0));
    assert!(fixture.recorded().video.is_empty());
    assert!(fixture.recorded().subtitle.is_empty());
}

#[test]
fn test_select_stream_without_media_is_ignored() {
    let mut fixture = TestFixture::with_engine(movie_engine());

    fixture.player.execute(PlayerCommand::SelectStream(TrackKind::Audio, 1));

    assert_eq!(fixture.engine.current_track(TrackKind::Audio), 0);
    assert!(fixture.recorded().audio.is_empty());
}

#[test]
fn test_toggle_stream_info() {
    let mut fixture = TestFixture::new();

    fixture.player.execute(PlayerCommand::ToggleStreamInfo);
    fixture.player.execute(PlayerCommand::ToggleStreamInfo);

    assert_eq!(fixture.recorded().visibility_toggles, 2);
}

#[test]
fn test_stop_then_drop_forces_null() {
    let mut fixture = playing_movie();

    fixture.player.execute(PlayerCommand::Stop);
    assert_eq!(fixture.engine.snapshot().state, PipelineState::Ready);

    let engine = fixture.engine.clone();
    drop(fixture);
    assert_eq!(engine.snapshot().state, PipelineState::Null);
}
