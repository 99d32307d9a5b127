//! # Portsync
//!
//! ## Usage
//!
//! ```sh,ignore
//! QBITTORRENT_PORT_PLUGIN_QBITTORRENT_PASSWORD=secret cargo run --release -p portsync -- \
//!     --port-file /gluetun/forwarded_port --qbittorrent-api-netloc http://localhost:8080
//! ```

mod cli;

use std::process::ExitCode;

use clap::Parser;
use portsync_types as _;
use tokio::{
    signal::unix::{SignalKind, signal},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url as _;

use portsync::SyncConfiguration;

use crate::cli::Cli;

#[cfg(test)]
use axum as _;
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use test_log as _;

/// Exit code for an invalid configuration.
const CONFIG_ERROR_EXIT_CODE: u8 = 2;
/// Exit code when a second stop signal arrives before the loop stopped.
const HARSH_STOP_EXIT_CODE: i32 = 130;

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Spawns and returns the signals listener task.
///
/// The first SIGINT or SIGTERM cancels `cancel` so the loop stops after its current cycle. A
/// second one exits the process right away.
fn spawn_signal_listener(
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, Box<dyn std::error::Error>> {
    // Setup unix signals to listen to.
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let signals = tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {},
            _ = sigterm.recv() => {},
        }
        info!("Received graceful stop signal, exiting after the current sync...");
        cancel.cancel();

        tokio::select! {
            _ = sigint.recv() => {},
            _ = sigterm.recv() => {},
        }
        warn!("Received harsh stop signal, exiting now");
        std::process::exit(HARSH_STOP_EXIT_CODE);
    });

    Ok(signals)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = SyncConfiguration::from(Cli::parse());
    info!("Loaded configuration: {config:?}");

    let cancel = CancellationToken::new();
    let signals = match spawn_signal_listener(cancel.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to listen for signals: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = portsync::sync_until_cancelled(config, cancel).await;
    signals.abort();

    match result {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_config() => {
            error!("Failed to load configuration: {e}");
            ExitCode::from(CONFIG_ERROR_EXIT_CODE)
        }
        Err(e) => {
            error!("Failed to run sync loop: {e}");
            ExitCode::FAILURE
        }
    }
}
