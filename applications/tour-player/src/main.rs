/// Tour Player - headless audio-tour playback
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tour_player::{tour, JsonFileStore, SimulatedBackend, SimulationOptions, TourManifest};
use tour_playback::{backend_channel, store, EngineConfig, PlaybackEngine, TourProgress};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Length assumed for stops whose manifest entry has no duration
const DEFAULT_STOP_SECONDS: f64 = 90.0;

#[derive(Parser)]
#[command(name = "tour-player")]
#[command(about = "Headless audio-tour player", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play every stop of a tour manifest
    Play {
        /// Tour manifest (JSON)
        manifest: PathBuf,

        /// Engine configuration file
        #[arg(short, long, env = "TOUR_PLAYER_CONFIG")]
        config: Option<PathBuf>,

        /// State file for settings and progress
        #[arg(short, long, env = "TOUR_PLAYER_STATE")]
        state: Option<PathBuf>,

        /// Playback rate
        #[arg(long)]
        rate: Option<f32>,

        /// Pause playback after this many minutes
        #[arg(long)]
        sleep: Option<u32>,

        /// Media seconds simulated per wall-clock second
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Show progress saved in a state file
    Progress {
        /// State file for settings and progress
        #[arg(short, long, env = "TOUR_PLAYER_STATE")]
        state: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tour_player=info,tour_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            manifest,
            config,
            state,
            rate,
            sleep,
            speed,
        } => {
            play(
                &manifest,
                config.as_deref(),
                state,
                rate,
                sleep,
                speed,
            )
            .await?;
        }
        Commands::Progress { state } => {
            show_progress(&state)?;
        }
    }

    Ok(())
}

async fn play(
    manifest_path: &Path,
    config_path: Option<&Path>,
    state_path: Option<PathBuf>,
    rate: Option<f32>,
    sleep_minutes: Option<u32>,
    speed: f64,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        speed.is_finite() && speed > 0.0,
        "--speed must be positive"
    );

    let config = EngineConfig::load(config_path).context("Failed to load engine configuration")?;
    let manifest = TourManifest::load(manifest_path)?;

    tracing::info!("Starting tour '{}'", manifest.title);
    tracing::info!("Stops: {}", manifest.stops.len());

    let catalog: HashMap<String, f64> = manifest
        .stops
        .iter()
        .map(|stop| {
            (
                stop.audio.clone(),
                stop.duration.unwrap_or(DEFAULT_STOP_SECONDS),
            )
        })
        .collect();

    let (events_tx, events_rx) = backend_channel();
    let (backend, device) = SimulatedBackend::spawn(
        catalog,
        events_tx,
        SimulationOptions {
            step: Duration::from_millis(250),
            speed,
        },
    );

    let mut builder = PlaybackEngine::builder(config, backend, events_rx);
    if let Some(path) = state_path {
        let file_store = JsonFileStore::open(path)?;
        tracing::info!("State file: {}", file_store.path().display());
        builder = builder.store(file_store);
    }

    let engine = builder.start()?;
    let player = engine.handle();

    if let Some(rate) = rate {
        player.set_playback_rate(rate)?;
    }
    if let Some(minutes) = sleep_minutes {
        player.start_sleep_timer(minutes)?;
    }
    tour::start(&player, manifest.tracks())?;

    let outcome = tokio::select! {
        outcome = tour::follow(&player) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            player.stop()?;
            tour::TourOutcome::EngineStopped
        }
    };

    let snapshot = player.snapshot();
    engine.shutdown().await;

    // Backend was dropped with the engine, so the device winds down
    if let Err(e) = device.await {
        tracing::warn!("Simulated device task failed: {}", e);
    }

    tracing::info!(
        outcome = ?outcome,
        last_track = snapshot.current_track.as_ref().map(|t| t.id.as_str()),
        "Tour finished"
    );

    Ok(())
}

fn show_progress(state_path: &Path) -> anyhow::Result<()> {
    let file_store = JsonFileStore::open(state_path)?;
    let state = store::load_state(&file_store).context("State file holds invalid entries")?;

    println!(
        "Settings: quality={:?} autoplay={}",
        state.settings.preferred_quality, state.settings.autoplay
    );

    let mut tours: Vec<(&String, &TourProgress)> = state.tour_progress.iter().collect();
    tours.sort_by_key(|(id, _)| *id);

    if tours.is_empty() {
        println!("No tour progress recorded");
    }
    for (tour_id, progress) in tours {
        let segments: Vec<&str> = progress
            .completed_segments
            .iter()
            .map(String::as_str)
            .collect();
        println!(
            "{}: {} stop(s) completed [{}], last position {:.1}s",
            tour_id,
            segments.len(),
            segments.join(", "),
            progress.last_position
        );
    }

    Ok(())
}
