//! Segue Player - demo entry point
//!
//! Loads a playlist, queues it on the playback engine with the simulated
//! audio backend, and plays until the queue is exhausted or the process is
//! interrupted. Engine events are written to the log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use segue_common::events::{PlaybackState, QueueChangeTrigger, SegueEvent};
use segue_common::track::load_tracks;
use segue_common::Track;
use segue_player::audio::{SimulatedSessionFactory, TemplateResolver};
use segue_player::config::{LoggingConfig, TomlConfig};
use segue_player::playback::{
    AutoplaySupplier, CatalogSupplier, EngineDeps, LoggingMetadataSink, PlaybackEngine,
};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for segue-player
#[derive(Parser, Debug)]
#[command(name = "segue-player")]
#[command(about = "Gapless playback queue engine (simulated audio backend)")]
#[command(version)]
struct Args {
    /// JSON array of tracks to queue
    #[arg(short, long, env = "SEGUE_PLAYLIST")]
    playlist: PathBuf,

    /// TOML configuration file
    #[arg(short, long, env = "SEGUE_CONFIG")]
    config: Option<PathBuf>,

    /// JSON catalog the autoplay supplier picks suggestions from
    #[arg(long, env = "SEGUE_CATALOG")]
    catalog: Option<PathBuf>,

    /// Enable autoplay regardless of the config file
    #[arg(long)]
    autoplay: bool,

    /// Queue index to start at
    #[arg(long, default_value = "0")]
    start_index: usize,

    /// Simulated clock speed (2.0 = twice real time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path =
        segue_common::config::resolve_config_path(args.config.as_deref(), "SEGUE_CONFIG");
    let config =
        TomlConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.logging)?;

    info!("Starting Segue Player");
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    if !args.speed.is_finite() || args.speed <= 0.0 {
        bail!("--speed must be a positive number, got {}", args.speed);
    }

    let tracks = load_tracks(&args.playlist)
        .with_context(|| format!("Failed to load playlist {}", args.playlist.display()))?;
    ensure_playable(&tracks, &args.playlist)?;
    info!("Loaded {} tracks from {}", tracks.len(), args.playlist.display());

    let supplier: Option<Arc<dyn AutoplaySupplier>> = match &args.catalog {
        Some(path) => {
            let catalog = load_tracks(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?;
            info!("Autoplay catalog: {} tracks", catalog.len());
            Some(Arc::new(CatalogSupplier::new(catalog)))
        }
        None => None,
    };

    let mut tuning = config.engine.clone();
    if args.autoplay {
        tuning.autoplay_enabled = true;
    }

    let deps = EngineDeps {
        factory: Arc::new(SimulatedSessionFactory::new(
            tuning.position_interval(),
            args.speed,
        )),
        resolver: Arc::new(TemplateResolver::from_config(&config.stream)),
        supplier,
        metadata: Arc::new(LoggingMetadataSink),
    };

    let (player, task) = PlaybackEngine::spawn(deps, tuning, config.stream.format.clone())
        .context("Failed to start playback engine")?;

    let mut events = player.subscribe();
    player.set_queue(tracks, args.start_index).await?;
    player.play().await?;

    let end = tokio::select! {
        end = follow_events(&mut events) => end,
        _ = shutdown_signal() => PlaybackEnd::Interrupted,
    };

    let snapshot = player.snapshot().await?;
    debug!(
        "Final state: {}",
        serde_json::to_string(&snapshot).unwrap_or_else(|e| e.to_string())
    );

    player.shutdown().await?;
    task.await.context("Playback engine task failed")?;
    info!("Shutdown complete");

    match end {
        PlaybackEnd::Stopped => match snapshot.last_error {
            Some(err) => bail!("Playback stopped: {}", err),
            None => {
                warn!("Playback stopped before the queue ended");
                Ok(())
            }
        },
        PlaybackEnd::Exhausted => {
            info!("Playback finished");
            Ok(())
        }
        PlaybackEnd::Interrupted | PlaybackEnd::Closed => Ok(()),
    }
}

/// Reject playlists the engine would sit idle on
fn ensure_playable(tracks: &[Track], source: &Path) -> Result<()> {
    if tracks.is_empty() {
        bail!("Playlist {} contains no tracks", source.display());
    }
    for track in tracks.iter().filter(|t| t.duration_seconds <= 0.0) {
        warn!("{} ({}) has no duration and will fail to load", track.title, track.id);
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "segue_player={0},segue_common={0}",
            logging.level
        ))
    });

    let file_layer = match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// Why `follow_events` returned
#[derive(Debug, PartialEq, Eq)]
enum PlaybackEnd {
    /// The queue played out
    Exhausted,
    /// The engine went idle early (load failure)
    Stopped,
    Interrupted,
    /// Event bus gone
    Closed,
}

/// Log engine events until the engine goes idle
async fn follow_events(events: &mut broadcast::Receiver<SegueEvent>) -> PlaybackEnd {
    loop {
        match events.recv().await {
            Ok(SegueEvent::TrackStarted {
                track_id,
                queue_index,
                ..
            }) => info!("[{}] {} started", queue_index, track_id),
            Ok(SegueEvent::TrackCompleted {
                track_id,
                position,
                completed,
                ..
            }) => info!(
                "{} {} at {:.2}s",
                track_id,
                if completed { "completed" } else { "left" },
                position
            ),
            Ok(SegueEvent::AutoplayAppended {
                seed_track_id,
                count,
                ..
            }) => info!("Autoplay added {} tracks after {}", count, seed_track_id),
            Ok(SegueEvent::PlaybackError {
                track_id, message, ..
            }) => error!(
                "Playback error ({}): {}",
                track_id.as_deref().unwrap_or("-"),
                message
            ),
            Ok(SegueEvent::QueueChanged {
                trigger: QueueChangeTrigger::Exhausted,
                ..
            }) => return PlaybackEnd::Exhausted,
            Ok(SegueEvent::PlaybackStateChanged {
                new_state: PlaybackState::Idle,
                ..
            }) => return PlaybackEnd::Stopped,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Event log lagged, skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => return PlaybackEnd::Closed,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
