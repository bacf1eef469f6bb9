mod commands;
mod sim;
mod view;

use crate::commands::{Input, HELP};
use crate::sim::SimulatedAudio;
use podcastr_catalog::HttpCatalog;
use podcastr_core::{
    load_episode, load_episodes, BinderEvent, CoreError, DisplayOptions, HomeListing, ListParams,
    MediaBinder, PlayerStore, PodcastrConfig, Progress,
};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Everything a command line needs to act on.
struct Session {
    config: PodcastrConfig,
    display: DisplayOptions,
    catalog: HttpCatalog,
    store: Arc<PlayerStore>,
    listing: HomeListing,
    progress: watch::Receiver<Progress>,
}

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match PodcastrConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            println!(
                "A configuration file has been created at {}.\n\
                Point catalog.base_url at your episode API and run podcastr again.",
                path.display()
            );
            std::process::exit(0);
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let display = match config.display.options() {
        Ok(display) => display,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let catalog = match HttpCatalog::from_config(&config.catalog) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to create catalog client: {e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    runtime.block_on(run(config, display, catalog, &cancel_token));

    // Stdin reads park a blocking thread that never returns on its own
    runtime.shutdown_timeout(Duration::from_millis(500));
}

async fn run(
    config: PodcastrConfig,
    display: DisplayOptions,
    catalog: HttpCatalog,
    cancel_token: &CancellationToken,
) {
    let store = PlayerStore::new();

    let (media_tx, media_rx) = mpsc::unbounded_channel();
    let audio = SimulatedAudio::new(media_tx, config.player.simulation_speed);
    let binder = MediaBinder::new(store.clone(), audio);

    let (progress_tx, progress_rx) = watch::channel(Progress::default());
    tokio::spawn(log_binder_events(binder.subscribe(), progress_tx));

    let progress_interval = Duration::from_millis(config.player.progress_interval_ms);
    let binder_handle = binder.start(media_rx, progress_interval, cancel_token.clone());

    let mut session = Session {
        config,
        display,
        catalog,
        store,
        listing: HomeListing::new(Vec::new(), 0),
        progress: progress_rx,
    };
    session.refresh_listing().await;
    println!("{}", view::render_listing(&session.listing));
    println!("Type 'help' for a list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read input: {e}");
                break;
            }
        };

        match commands::parse(&line) {
            Ok(Some(Input::Quit)) => break,
            Ok(Some(input)) => session.execute(input).await,
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
    }

    cancel_token.cancel();
    let _ = binder_handle.await;
    info!("Goodbye");
}

impl Session {
    async fn refresh_listing(&mut self) {
        let params = ListParams::new(
            self.config.catalog.limit,
            &self.config.catalog.order,
            &self.config.catalog.sort,
        );
        match load_episodes(&self.catalog, &params, &self.display).await {
            Ok(episodes) => {
                self.listing = HomeListing::new(episodes, self.config.display.latest_count);
            }
            Err(e) => error!("Failed to load episodes: {e}"),
        }
    }

    async fn execute(&mut self, input: Input) {
        match input {
            Input::List => {
                self.refresh_listing().await;
                println!("{}", view::render_listing(&self.listing));
            }
            Input::PlayRow(row) => {
                if let Err(e) = self.store.play_list(self.listing.playlist(), row) {
                    println!("{}", row_error(&e, row));
                }
            }
            Input::Episode(id) => match load_episode(&self.catalog, &id, &self.display).await {
                Ok(episode) => {
                    println!("{}", view::render_episode(&episode));
                    self.store.play(episode);
                }
                Err(CoreError::EpisodeNotFound { id }) => println!("No episode with id '{id}'"),
                Err(e) => error!("Failed to load episode {id}: {e}"),
            },
            Input::Player(command) => {
                if let Err(e) = self.store.dispatch(command) {
                    warn!("{e}");
                }
            }
            Input::Status => {
                let progress = *self.progress.borrow();
                println!("{}", view::render_status(&self.store.snapshot(), progress));
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => {}
        }
    }
}

fn row_error(error: &CoreError, row: usize) -> String {
    match error {
        CoreError::InvalidIndex { len, .. } => {
            format!("There is no row {} (the listing has {len} row(s))", row + 1)
        }
        other => other.to_string(),
    }
}

/// Log binder events and keep the latest progress for `status`
async fn log_binder_events(
    mut rx: broadcast::Receiver<BinderEvent>,
    progress: watch::Sender<Progress>,
) {
    loop {
        match rx.recv().await {
            Ok(event) => match &event {
                BinderEvent::TrackLoaded { episode, load } => {
                    progress.send_replace(Progress {
                        elapsed: Duration::ZERO,
                        duration: episode.duration(),
                    });
                    info!(
                        "Track loaded: {} [{}] ({})",
                        episode.title(),
                        episode.duration_display(),
                        load
                    );
                }
                BinderEvent::Ready { load } => {
                    info!("Ready to play ({})", load);
                }
                BinderEvent::Playing => {
                    info!("Playing");
                }
                BinderEvent::Paused => {
                    info!("Paused");
                }
                BinderEvent::Stopped => {
                    progress.send_replace(Progress::default());
                    info!("Playback stopped");
                }
                BinderEvent::Progress(p) => {
                    progress.send_replace(*p);
                }
                BinderEvent::Error { message } => {
                    error!("Player error: {}", message);
                }
            },
            Err(broadcast::error::RecvError::Closed) => {
                info!("Binder event channel closed");
                break;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                info!("Missed {} binder events", n);
            }
        }
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(PodcastrConfig::config_path()) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest_retry=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = podcastr_core::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
