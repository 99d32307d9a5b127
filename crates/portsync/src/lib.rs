//! # Portsync
//!
//! Keeps qBittorrent's listening port equal to the port a VPN client forwards, read from a file.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use portsync::PortSyncer;
//! use portsync_qbittorrent::{Credentials, QBittorrentClient};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client =
//!         QBittorrentClient::try_new("http://localhost:8080", Credentials::new("admin", "secret"))?;
//!     let mut syncer = PortSyncer::new(client, "/gluetun/forwarded_port", true);
//!     syncer.run(Duration::from_secs(5), CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod syncer;

use clap as _;
use dotenvy as _;
use portsync_qbittorrent::QBittorrentClient;
use portsync_types::PortSyncError;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber as _;

pub use config::SyncConfiguration;
pub use syncer::{PortSyncer, SyncOutcome, parse_port, read_port_file};

#[cfg(test)]
use axum as _;
#[cfg(test)]
use serde_json as _;

/// Validates `config` and syncs the port every refresh interval until `cancel` fires.
pub async fn sync_until_cancelled(
    config: SyncConfiguration,
    cancel: CancellationToken,
) -> Result<(), PortSyncError> {
    config.validate()?;

    let client = QBittorrentClient::try_new(&config.api_url, config.credentials)?;
    let mut syncer = PortSyncer::new(client, config.port_file, config.allow_port_file_not_exist);

    syncer.run(config.refresh_interval, cancel).await?;
    info!("Sync loop stopped");
    Ok(())
}
