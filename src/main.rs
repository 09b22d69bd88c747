use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use stargaze::aggregator::{HttpObservationSource, TimeAggregator};
use stargaze::api::{self, AppState};
use stargaze::config::{Config, SourceConfig};
use stargaze::error::ConfigError;
use stargaze::random::RngSource;
use stargaze::store::ObservationStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments for the observation tracker
#[derive(Parser)]
#[command(
    name = "stargaze",
    about = "Telescope observation tracker - generated observation windows, problem and investigation reports, time metrics",
    long_about = "Serves an HTTP API that generates telescope observation windows over a time range, \
                  annotates failed observations with problem and investigation reports, and reports \
                  downtime, observed time and reported time over arbitrary intervals."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging output (debug level)")]
    verbose: bool,

    /// Listen address override
    #[arg(short, long, value_name = "ADDR", help = "Address to listen on, e.g. 127.0.0.1:8000")]
    listen: Option<String>,

    /// Random seed override
    #[arg(long, value_name = "N", help = "Seed for reproducible generation")]
    seed: Option<u64>,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref listen) = self.listen {
            config.server.listen_addr = listen.clone();
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}

/// Load configuration from file or use defaults
///
/// A missing or unreadable file falls back to defaults with a warning; an
/// invalid file is reported and also falls back to defaults.
fn load_config(config_path: Option<&std::path::Path>) -> Result<Config, ConfigError> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => Ok(config),
                Err(ConfigError::ReadError(_)) => {
                    warn!(
                        "Configuration file '{}' not found or unreadable, using defaults",
                        path.display()
                    );
                    Ok(Config::default())
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path.display(), e);
                    warn!("Using default configuration due to invalid config file");
                    Ok(Config::default())
                }
            }
        }
        None => {
            info!("Using default configuration");
            Ok(Config::default())
        }
    }
}

/// Build the store, the aggregator source and the shared handler state
fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let settings = config.store_settings();
    let store = Arc::new(match config.seed {
        Some(seed) => {
            info!("Using fixed random seed {}", seed);
            ObservationStore::seeded(settings, seed)
        }
        None => ObservationStore::new(settings, Box::new(RngSource::from_entropy())),
    });

    let state = match &config.source {
        SourceConfig::InProcess => AppState::in_process(store),
        SourceConfig::Http { endpoint } => {
            info!("Aggregator reads observations from {}", endpoint);
            let source = HttpObservationSource::new(endpoint.clone())
                .context("failed to create HTTP observation source")?;
            AppState::new(store, TimeAggregator::new(Arc::new(source)))
        }
    };

    Ok(Arc::new(state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Received interrupt signal, shutting down gracefully...");
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate().context("invalid configuration")?;

    let addr = config.listen_addr()?;
    let state = build_state(&config)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Observation tracker listening on http://{}", addr);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Observation tracker shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    info!("Starting observation tracker");

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
