//! qBittorrent WebUI session client implementation.

use std::fmt;

use portsync_types::{ListenPortControl, PortSyncError};
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::ops::{ApiCall, ApiResponse, HttpOps, QBittorrentOps, SessionCookie};
use crate::preferences::{Preferences, PreferencesUpdate};


/// How many times an authenticated call may log in again after its session is rejected.
const REAUTH_ATTEMPTS: usize = 1;

/// Body qBittorrent answers a login with when it rejects the credentials with a 200.
const LOGIN_REJECTED_BODY: &str = "Fails.";

/// Username and password for the WebUI.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The WebUI username.
    pub username: String,
    /// The WebUI password.
    pub password: String,
}

impl Credentials {
    /// Creates a new credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the password.
        write!(
            f,
            "Credentials(username=\"{}\", password=<{}>)",
            self.username,
            if self.password.is_empty() {
                "unset"
            } else {
                "redacted"
            }
        )
    }
}

/// QBittorrentClient manages the listening port of a qBittorrent instance over its WebUI API.
///
/// The client owns its session cookie. Every authenticated call is first sent with the current
/// session; if the server rejects it the client logs in once and retries once.
#[allow(private_bounds)]
pub struct QBittorrentClient<T: QBittorrentOps = HttpOps> {
    ops: T,
    credentials: Credentials,
    session: Option<SessionCookie>,
}

impl QBittorrentClient {
    /// Create a new QBittorrentClient for the WebUI at `api_url`, e.g. `http://localhost:8080`.
    ///
    /// No request is made until the first call; logging in happens on demand.
    pub fn try_new(api_url: &str, credentials: Credentials) -> Result<Self, PortSyncError> {
        let url = Url::parse(api_url).map_err(|e| {
            PortSyncError::Config(format!("invalid qBittorrent API URL '{api_url}': {e}"))
        })?;

        debug!("Using qBittorrent WebUI API at {}", url);
        Ok(Self::with_ops(HttpOps::new(url)?, credentials))
    }
}

#[allow(private_bounds)]
impl<T: QBittorrentOps> QBittorrentClient<T> {
    pub(crate) fn with_ops(ops: T, credentials: Credentials) -> Self {
        Self {
            ops,
            credentials,
            session: None,
        }
    }

    /// Returns true once a login has produced a session cookie.
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Authenticates with the stored credentials and retains the session cookie.
    ///
    /// Returns [`PortSyncError::NotAuthorized`] if the server rejects the credentials. Not retried.
    pub async fn login(&mut self) -> Result<(), PortSyncError> {
        debug!("Logging in to qBittorrent as {}", self.credentials.username);
        let response = self
            .ops
            .login(&self.credentials.username, &self.credentials.password)
            .await?;

        if is_rejected(response.status) {
            return Err(PortSyncError::NotAuthorized(format!(
                "status code={}, body='{}'",
                response.status,
                response.body.trim()
            )));
        }
        if !response.status.is_success() {
            return Err(PortSyncError::Protocol(format!(
                "failed to login, status code={}, body='{}'",
                response.status,
                response.body.trim()
            )));
        }
        if response.body.trim() == LOGIN_REJECTED_BODY {
            return Err(PortSyncError::NotAuthorized(format!(
                "server replied '{LOGIN_REJECTED_BODY}'"
            )));
        }

        let cookie = response.cookie.ok_or_else(|| {
            PortSyncError::Protocol("login succeeded without setting a session cookie".into())
        })?;
        debug!("Logged in, session {cookie:?}");
        self.session = Some(cookie);
        Ok(())
    }

    /// Sends `call` with the current session, logging in again at most [`REAUTH_ATTEMPTS`] times
    /// when the session is rejected. Any other non-success status is a protocol error.
    async fn authorized(&mut self, call: ApiCall) -> Result<ApiResponse, PortSyncError> {
        for attempt in 0..=REAUTH_ATTEMPTS {
            if attempt > 0 {
                if self.session.is_some() {
                    warn!("qBittorrent rejected the session, logging in again");
                } else {
                    debug!("qBittorrent requires a session, logging in");
                }
                self.login().await?;
            }

            let response = self.ops.call(call.clone(), self.session.clone()).await?;
            if is_rejected(response.status) {
                debug!("{call:?} rejected with status {}", response.status);
                continue;
            }
            if !response.status.is_success() {
                return Err(PortSyncError::Protocol(format!(
                    "{call:?} failed: status code={}, body='{}'",
                    response.status,
                    response.body.trim()
                )));
            }
            return Ok(response);
        }

        Err(PortSyncError::Unauthorized)
    }
}

#[allow(private_bounds)]
impl<T: QBittorrentOps> ListenPortControl for QBittorrentClient<T> {
    async fn listening_port(&mut self) -> Result<u16, PortSyncError> {
        debug!("Getting qBittorrent preferences");
        let response = self.authorized(ApiCall::Preferences).await?;
        let preferences: Preferences = serde_json::from_str(&response.body).map_err(|e| {
            PortSyncError::Protocol(format!("failed to decode preferences JSON: {e}"))
        })?;
        debug!("qBittorrent listens on port {}", preferences.listen_port);

        Ok(preferences.listen_port)
    }

    async fn set_listening_port(&mut self, port: u16) -> Result<(), PortSyncError> {
        debug!("Setting qBittorrent listening port to {port}");
        let json = serde_json::to_string(&PreferencesUpdate { listen_port: port }).map_err(|e| {
            PortSyncError::Protocol(format!("failed to encode preferences as JSON: {e}"))
        })?;
        self.authorized(ApiCall::SetPreferences { json }).await?;
        debug!("Set preferences command sent");

        Ok(())
    }
}

#[allow(private_bounds)]
impl<T: QBittorrentOps> fmt::Debug for QBittorrentClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QBittorrentClient")
            .field("credentials", &self.credentials)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// qBittorrent answers 403 to requests without a valid session; 401 is accepted too.
fn is_rejected(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED
}
