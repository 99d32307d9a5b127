//! # qBittorrent session client for portsync.
//!
//! usage:
//!
//! ```rust,ignore
//! use portsync_qbittorrent::{Credentials, QBittorrentClient};
//! use portsync_types::ListenPortControl;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client =
//!         QBittorrentClient::try_new("http://localhost:8080", Credentials::new("admin", "secret"))?;
//!     if client.listening_port().await? != 51413 {
//!         client.set_listening_port(51413).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!

mod client;
mod ops;
mod preferences;
#[cfg(test)]
mod testutil;

pub use client::{Credentials, QBittorrentClient};
pub use ops::HttpOps;
