//! Modular monolith service host binary.
//!
//! Loads configuration, composes the shipped feature modules, serves until
//! SIGINT/SIGTERM and exits with the shutdown outcome's status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use modular_monolith::config::{self, AppConfig};
use modular_monolith::contexts;
use modular_monolith::lifecycle::{self, LifecycleError, Shutdown, ShutdownOutcome, StartupError};
use modular_monolith::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "modular-monolith")]
#[command(about = "Compose feature modules into one HTTP service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match launch(cli).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("modular-monolith: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn launch(cli: Cli) -> Result<ShutdownOutcome, StartupError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "modular-monolith starting");
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        grace_ms = config.server.shutdown_grace_ms,
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    // Handlers go in before composition so an early signal still exits 0.
    let shutdown = Shutdown::new();
    lifecycle::spawn_signal_listener(shutdown.clone()).map_err(StartupError::Signals)?;

    let mut server =
        lifecycle::bootstrap_with_shutdown(&config.server, contexts::default_modules(), shutdown).await?;
    match server.start(config.server.port).await {
        // `run` sees the recorded signal and stops from Idle.
        Ok(_) | Err(LifecycleError::ShutdownRequested) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(server.run().await)
}
