//! Validated configuration handed to the sync loop.

use std::{fmt, path::PathBuf, time::Duration};

use portsync_qbittorrent::Credentials;
use portsync_types::PortSyncError;
use url::Url;

/// Configuration for a [`crate::PortSyncer`] driving a qBittorrent instance.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfiguration {
    /// Path of the file holding only the VPN's forwarded port.
    pub port_file: PathBuf,
    /// Whether a missing port file skips the cycle instead of failing it.
    pub allow_port_file_not_exist: bool,
    /// Time between two syncs.
    pub refresh_interval: Duration,
    /// Base URL of the qBittorrent WebUI API, e.g. `http://localhost:8080`.
    pub api_url: String,
    /// WebUI credentials.
    pub credentials: Credentials,
}

impl SyncConfiguration {
    /// Checks the configuration before anything is started.
    pub fn validate(&self) -> Result<(), PortSyncError> {
        if self.port_file.as_os_str().is_empty() {
            return Err(PortSyncError::Config("port file path is empty".into()));
        }
        if self.refresh_interval.is_zero() {
            return Err(PortSyncError::Config(
                "refresh interval must be greater than zero".into(),
            ));
        }

        let url = Url::parse(&self.api_url).map_err(|e| {
            PortSyncError::Config(format!(
                "failed to parse qBittorrent API location '{}' into a valid URL: {e}",
                self.api_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PortSyncError::Config(format!(
                "qBittorrent API location '{}' must be an http or https URL",
                self.api_url
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for SyncConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyncConfiguration(port_file=\"{}\", allow_port_file_not_exist={}, refresh_interval={:?}, api_url=\"{}\", credentials={:?})",
            self.port_file.display(),
            self.allow_port_file_not_exist,
            self.refresh_interval,
            self.api_url,
            self.credentials,
        )
    }
}
