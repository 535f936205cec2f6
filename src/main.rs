use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::io::BufRead;
use std::path::Path;
use tokio::sync::mpsc;

use mbmp::engine::{GstEngine, PlayFlags, TrackKind};
use mbmp::player::{
    JsonLinesSink, LogSink, LogStreamView, LogWindow, PlayerCommand, PlayerInterface,
    POLL_INTERVAL,
};
use mbmp::utils::config::MAX_VOLUME;
use mbmp::utils::{self, MbmpError, Settings};

/// Volume change for one `+` or `-` command
const VOLUME_STEP: f64 = 0.1;

/// MBMP - a media player driving a GStreamer playbin
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Media file or URI to play
    #[arg(value_name = "URI")]
    uri: Option<String>,

    /// Initial volume, 1.0 is 100% (0.0 to 10.0)
    #[arg(short, long, value_name = "VOLUME")]
    volume: Option<f64>,

    /// Connection speed hint for network streams, in kbps
    #[arg(long, value_name = "KBPS")]
    connection_speed: Option<u64>,

    /// Visualizer to show for audio-only media
    #[arg(long, value_name = "NAME")]
    visualizer: Option<String>,

    /// Render subtitles
    #[arg(short, long)]
    subtitles: bool,

    /// List the available visualizers and exit
    #[arg(long)]
    list_visualizers: bool,

    /// Print notifications as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = utils::load_settings();
    let log_level = match (&settings, args.debug) {
        (_, true) => "debug".to_string(),
        (Ok(settings), false) => settings.start_options.log_level.clone(),
        (Err(_), false) => "info".to_string(),
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    info!("Starting MBMP v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = settings.unwrap_or_else(|e| {
        warn!("Using default settings: {}", e);
        Settings::default()
    });

    let engine = GstEngine::new().context("Failed to create the playback pipeline")?;

    let mut builder = PlayerInterface::builder(engine)
        .window(LogWindow::new())
        .stream_view(LogStreamView::new())
        .sink(LogSink::new());
    if args.json {
        builder = builder.sink(JsonLinesSink::new(std::io::stdout()));
    }
    let mut player = builder.build();

    if args.list_visualizers {
        for name in player.controller().visualizer_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    // Settings first, command line wins
    let controller = player.controller();
    if settings.preferences.use_startoptions {
        controller.apply_start_options(&settings.start_options);
    }
    if let Some(kbps) = args.connection_speed {
        controller.change_connection_speed(kbps);
    }
    if args.subtitles {
        controller.set_play_flag(PlayFlags::TEXT, true);
    }
    if let Some(name) = &args.visualizer {
        controller.set_play_flag(PlayFlags::VIS, true);
        controller.change_visualizer(name);
    }

    let volume = utils::clamp(
        args.volume.unwrap_or(settings.start_options.volume),
        0.0,
        MAX_VOLUME,
    );
    controller.change_volume(volume);

    let uri = match &args.uri {
        Some(input) => Some(to_uri(input)?),
        None => None,
    };
    if let Some(uri) = &uri {
        player.execute(PlayerCommand::PlayMedia {
            window: None,
            uri: uri.clone(),
        });
    } else {
        info!("No media given, waiting for commands");
    }

    let (tx, rx) = mpsc::channel(32);
    spawn_stdin_reader(tx.clone(), volume);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(PlayerCommand::Shutdown).await;
        }
    });

    let player = mbmp::player::run(player, rx, POLL_INTERVAL).await;
    drop(player);

    if settings.preferences.retain_playlist {
        if let Some(uri) = uri {
            settings.save_playlist(vec![uri], Some(0), 0);
            if let Err(e) = settings.save() {
                error!("Could not save settings: {}", e);
            }
        }
    }

    info!("MBMP shut down");
    Ok(())
}

/// Turn a path or URI argument into a URI
///
/// Local paths are percent-encoded, so names containing `#`, `?` or `%`
/// reach playbin intact.
fn to_uri(input: &str) -> Result<String> {
    if input.contains("://") {
        return Ok(input.to_string());
    }

    let path = Path::new(input)
        .canonicalize()
        .with_context(|| format!("Media file not found: {}", input))?;
    let uri = gstreamer::glib::filename_to_uri(&path, None)
        .with_context(|| format!("Cannot build a URI for {}", path.display()))?;
    Ok(uri.to_string())
}

/// Read interactive commands from stdin on a dedicated thread
fn spawn_stdin_reader(tx: mpsc::Sender<PlayerCommand>, initial_volume: f64) {
    std::thread::spawn(move || {
        let mut volume = initial_volume;
        let stdin = std::io::stdin();

        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match parse_command(line, &mut volume) {
                Ok(command) => command,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            let shutdown = command == PlayerCommand::Shutdown;
            if tx.blocking_send(command).is_err() || shutdown {
                break;
            }
        }
    });
}

/// Parse one interactive command
///
/// `volume` tracks the volume so `+` and `-` can step it.
fn parse_command(line: &str, volume: &mut f64) -> utils::Result<PlayerCommand> {
    let (word, arg) = match line.split_once(' ') {
        Some((word, arg)) => (word, Some(arg.trim())),
        None => (line, None),
    };

    let command = match (word, arg) {
        ("p", None) => PlayerCommand::PlayPause,
        ("s", None) => PlayerCommand::Stop,
        ("m", None) => PlayerCommand::ToggleMute,
        ("+", None) | ("-", None) => {
            let step = if word == "+" { VOLUME_STEP } else { -VOLUME_STEP };
            *volume = utils::clamp(*volume + step, 0.0, MAX_VOLUME);
            PlayerCommand::SetVolume(*volume)
        }
        ("seek", Some(seconds)) => PlayerCommand::Seek(parse_number(word, seconds)?),
        ("vis", Some(name)) => PlayerCommand::ChangeVisualizer(name.to_string()),
        ("audio", Some(index)) => {
            PlayerCommand::SelectStream(TrackKind::Audio, parse_number(word, index)?)
        }
        ("video", Some(index)) => {
            PlayerCommand::SelectStream(TrackKind::Video, parse_number(word, index)?)
        }
        ("text", Some(index)) => {
            PlayerCommand::SelectStream(TrackKind::Text, parse_number(word, index)?)
        }
        ("info", None) => PlayerCommand::ToggleStreamInfo,
        ("q", None) => PlayerCommand::Shutdown,
        _ => {
            return Err(MbmpError::InvalidInput(format!("unknown command '{}'", line)));
        }
    };

    Ok(command)
}

fn parse_number<T: std::str::FromStr>(word: &str, arg: &str) -> utils::Result<T> {
    arg.parse().map_err(|_| {
        MbmpError::InvalidInput(format!("'{}' expects a number, got '{}'", word, arg))
    })
}
