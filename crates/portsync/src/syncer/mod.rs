//! The reconciliation loop: read the desired port, compare it with the torrent client, and push
//! an update only when they differ.

use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use portsync_types::{ListenPortControl, PortSyncError};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Result of one reconciliation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The torrent client already listened on the desired port.
    Unchanged {
        /// The desired and current port.
        port: u16,
    },
    /// The torrent client's listening port was updated.
    Changed {
        /// The port the client listened on before.
        from: u16,
        /// The desired port, now set.
        to: u16,
    },
    /// The port file does not exist yet and that is tolerated. Nothing was contacted.
    Skipped,
}

impl SyncOutcome {
    /// Whether the cycle wrote a new listening port.
    pub fn changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged { port } => write!(f, "no change to torrent port (is: {port})"),
            Self::Changed { from, to } => write!(f, "changed torrent port from {from} to {to}"),
            Self::Skipped => write!(f, "port file does not exist yet, skipped"),
        }
    }
}

/// Parses port file contents.
///
/// Surrounding ASCII whitespace is ignored, so the trailing newline VPN clients usually write is
/// fine. What remains must be ASCII digits only (no sign) with a value of at most 65535.
pub fn parse_port(contents: &str) -> Result<u16, String> {
    let digits = contents.trim_ascii();
    if digits.is_empty() {
        return Err("file is empty".into());
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{digits}' is not a base-10 integer"));
    }
    digits
        .parse::<u16>()
        .map_err(|_| format!("{digits} is outside of the range 0-65535"))
}

/// Reads and parses the port file at `path`. Every call reads the file fresh.
pub async fn read_port_file(path: &Path) -> Result<u16, PortSyncError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PortSyncError::PortFileMissing {
            path: path.to_path_buf(),
        },
        _ => PortSyncError::PortFileUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    let contents = String::from_utf8(bytes).map_err(|_| PortSyncError::PortFileInvalid {
        path: path.to_path_buf(),
        reason: "contents are not UTF-8".into(),
    })?;

    parse_port(&contents).map_err(|reason| PortSyncError::PortFileInvalid {
        path: path.to_path_buf(),
        reason,
    })
}

/// PortSyncer keeps a torrent client's listening port equal to the port in the port file.
#[derive(Debug)]
pub struct PortSyncer<C> {
    client: C,
    port_file: PathBuf,
    allow_missing_port_file: bool,
}

impl<C: ListenPortControl> PortSyncer<C> {
    /// Creates a new PortSyncer. If `allow_missing_port_file` is false a missing port file fails
    /// the cycle, otherwise the cycle is skipped.
    pub fn new(client: C, port_file: impl Into<PathBuf>, allow_missing_port_file: bool) -> Self {
        Self {
            client,
            port_file: port_file.into(),
            allow_missing_port_file,
        }
    }

    /// The torrent client being managed.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Reads the desired port from the port file.
    pub async fn read_desired_port(&self) -> Result<u16, PortSyncError> {
        read_port_file(&self.port_file).await
    }

    /// Ensures the torrent client listens on `port`. Only writes when the ports differ.
    async fn reconcile(&mut self, port: u16) -> Result<SyncOutcome, PortSyncError> {
        let current = self.client.listening_port().await?;
        if current == port {
            return Ok(SyncOutcome::Unchanged { port });
        }

        self.client.set_listening_port(port).await?;
        Ok(SyncOutcome::Changed {
            from: current,
            to: port,
        })
    }

    /// Runs one read-compare-write cycle.
    ///
    /// The port file is checked before the torrent client is contacted, so a tolerated missing
    /// file makes no API call at all.
    #[instrument(skip(self), fields(port_file = %self.port_file.display()))]
    pub async fn reconcile_once(&mut self) -> Result<SyncOutcome, PortSyncError> {
        let port = match self.read_desired_port().await {
            Ok(port) => port,
            Err(PortSyncError::PortFileMissing { .. }) if self.allow_missing_port_file => {
                warn!("Port file does not exist yet, skipping sync");
                return Ok(SyncOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };
        debug!("Desired port is {port}");

        let outcome = self.reconcile(port).await?;
        info!("Sync finished: {outcome}");
        Ok(outcome)
    }

    /// Reconciles immediately, then once per `interval` until `cancel` fires.
    ///
    /// Cycles never overlap; a slow cycle delays the next tick. Cancellation is observed between
    /// cycles only, a cycle in flight always runs to completion. The first failing cycle stops the
    /// loop and its error is returned.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero, like [`tokio::time::interval`].
    pub async fn run(
        &mut self,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Result<(), PortSyncError> {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting sync loop, refreshing every {interval:?}");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Sync loop cancelled");
                    return Ok(());
                }
                _ = ticker.tick() => {}
            }

            self.reconcile_once().await?;
        }
    }
}
