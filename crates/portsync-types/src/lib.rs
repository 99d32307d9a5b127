//! # Portsync Types
//!
//! This crate defines the error type and the torrent client trait shared by the portsync crates.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for port synchronization.
#[derive(Error, Debug)]
pub enum PortSyncError {
    /// Invalid configuration, detected before any synchronization starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The port file does not exist and a missing file is not tolerated.
    #[error("port file '{}' does not exist", path.display())]
    PortFileMissing {
        /// Path of the port file.
        path: PathBuf,
    },

    /// The port file exists but its contents are not a valid port number.
    #[error("port file '{}' does not contain a valid port: {reason}", path.display())]
    PortFileInvalid {
        /// Path of the port file.
        path: PathBuf,
        /// Why the contents were rejected.
        reason: String,
    },

    /// The port file exists but could not be read.
    #[error("failed to read port file '{}': {reason}", path.display())]
    PortFileUnreadable {
        /// Path of the port file.
        path: PathBuf,
        /// The underlying I/O error.
        reason: String,
    },

    /// Network-related errors (connection failures, resets, etc.)
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with an unexpected status or an undecodable payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server rejected the stored credentials at login.
    #[error("credentials not authorized: {0}")]
    NotAuthorized(String),

    /// The session was rejected again right after logging in again.
    #[error("session unauthorized after re-authentication")]
    Unauthorized,
}

impl PortSyncError {
    /// Returns true if the error was raised while validating configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// ListenPortControl is the interface to a torrent client whose listening port can be managed.
///
/// Implementations own their session state, hence the `&mut self` receivers.
#[allow(async_fn_in_trait)]
pub trait ListenPortControl {
    /// Get the port the torrent client currently listens on for incoming peer connections.
    async fn listening_port(&mut self) -> Result<u16, PortSyncError>;
    /// Set the listening port. No other client preference is touched.
    async fn set_listening_port(&mut self, port: u16) -> Result<(), PortSyncError>;
}
