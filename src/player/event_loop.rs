//! Player event loop
//!
//! A single task owns the [`PlayerInterface`]. It polls the bus on a fixed
//! interval and executes commands between ticks, so a tick is never
//! interleaved with a command.

use crate::engine::{MediaEngine, PlayFlags, TrackKind};
use crate::player::interface::PlayerInterface;
use log::{debug, info};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Interval between bus polls
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Control requests accepted by the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Play a URI, optionally rendering into a native window
    PlayMedia { window: Option<usize>, uri: String },
    PlayPause,
    Stop,
    /// Seek to a position in seconds
    Seek(u64),
    SetVolume(f64),
    ToggleMute,
    /// Connection speed hint in kbps
    SetConnectionSpeed(u64),
    SetPlayFlag(PlayFlags, bool),
    ChangeVisualizer(String),
    SelectStream(TrackKind, i32),
    ToggleStreamInfo,
    Shutdown,
}

impl<E: MediaEngine> PlayerInterface<E> {
    /// Execute one command
    ///
    /// `Shutdown` is handled by the loop itself and ignored here.
    pub fn execute(&mut self, command: PlayerCommand) {
        debug!("Executing {:?}", command);

        match command {
            PlayerCommand::PlayMedia { window, uri } => self.controller.play_media(window, &uri),
            PlayerCommand::PlayPause => self.controller.play_pause(),
            PlayerCommand::Stop => self.controller.stop(),
            PlayerCommand::Seek(seconds) => self.controller.seek_to_position(seconds),
            PlayerCommand::SetVolume(volume) => self.controller.change_volume(volume),
            PlayerCommand::ToggleMute => self.controller.toggle_mute(),
            PlayerCommand::SetConnectionSpeed(kbps) => {
                self.controller.change_connection_speed(kbps)
            }
            PlayerCommand::SetPlayFlag(flag, enabled) => {
                self.controller.set_play_flag(flag, enabled)
            }
            PlayerCommand::ChangeVisualizer(name) => self.controller.change_visualizer(&name),
            PlayerCommand::SelectStream(kind, index) => self.set_stream(kind, index),
            PlayerCommand::ToggleStreamInfo => self.toggle_stream_info(),
            PlayerCommand::Shutdown => {}
        }
    }
}

/// Run the player until shutdown
///
/// # Arguments
///
/// * `player` - The player, owned by the loop while it runs
/// * `commands` - Command receiver; closing every sender shuts down too
/// * `poll_interval` - Time between bus polls
///
/// # Returns
///
/// The player, so the caller decides when the pipeline is torn down
pub async fn run<E: MediaEngine>(
    mut player: PlayerInterface<E>,
    mut commands: mpsc::Receiver<PlayerCommand>,
    poll_interval: Duration,
) -> PlayerInterface<E> {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Player event loop started, polling every {:?}", poll_interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => player.poll_bus(),
            command = commands.recv() => match command {
                Some(PlayerCommand::Shutdown) | None => break,
                Some(command) => player.execute(command),
            },
        }
    }

    info!("Player event loop stopped");
    player
}
