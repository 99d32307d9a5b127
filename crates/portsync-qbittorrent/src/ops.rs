//! Internal trait abstracting the qBittorrent WebUI HTTP exchange.
//!
//! This module provides the [`QBittorrentOps`] trait which abstracts the raw HTTP transport,
//! enabling mocking in tests, and [`HttpOps`], the `reqwest` implementation used in production.

use std::fmt;

use portsync_types::PortSyncError;
use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{COOKIE, HeaderMap, REFERER, SET_COOKIE},
};
use tracing::debug;
use url::Url;

const LOGIN_PATH: &str = "/api/v2/auth/login";
const PREFERENCES_PATH: &str = "/api/v2/app/preferences";
const SET_PREFERENCES_PATH: &str = "/api/v2/app/setPreferences";

/// An authenticated WebUI API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ApiCall {
    /// `GET /api/v2/app/preferences`
    Preferences,
    /// `POST /api/v2/app/setPreferences` with the given JSON as the `json` form field.
    SetPreferences { json: String },
}

/// The `name=value` pair of the cookie qBittorrent hands out on login.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct SessionCookie(String);

impl SessionCookie {
    pub(crate) fn new(pair: impl Into<String>) -> Self {
        Self(pair.into())
    }

    fn name(&self) -> &str {
        self.0.split_once('=').map_or(self.0.as_str(), |(name, _)| name)
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the session id.
        write!(f, "SessionCookie({}=<redacted>)", self.name())
    }
}

/// What the client needs to know about an HTTP response.
#[derive(Debug, Clone)]
pub(crate) struct ApiResponse {
    pub(crate) status: StatusCode,
    pub(crate) body: String,
    /// Session cookie set by the response, if any.
    pub(crate) cookie: Option<SessionCookie>,
}

/// Internal trait that abstracts the qBittorrent HTTP operations.
/// This allows for mocking in tests.
#[cfg_attr(test, mockall::automock)]
#[allow(async_fn_in_trait)]
pub(crate) trait QBittorrentOps {
    async fn login(&self, username: &str, password: &str) -> Result<ApiResponse, PortSyncError>;
    async fn call(
        &self,
        call: ApiCall,
        session: Option<SessionCookie>,
    ) -> Result<ApiResponse, PortSyncError>;
}

/// `reqwest` backed transport.
#[derive(Debug)]
pub struct HttpOps {
    http: Client,
    base_url: Url,
}

impl HttpOps {
    pub(crate) fn new(base_url: Url) -> Result<Self, PortSyncError> {
        let http = Client::builder()
            .build()
            .map_err(|e| PortSyncError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// Appends `path` to the base URL path, so APIs served under a sub-path keep working.
    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", self.base_url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, PortSyncError> {
        let response = request
            .header(REFERER, self.base_url.as_str())
            .send()
            .await
            .map_err(|e| PortSyncError::Transport(format!("failed to make HTTP request: {e}")))?;

        let status = response.status();
        let cookie = session_cookie(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| PortSyncError::Transport(format!("failed to read response body: {e}")))?;
        debug!("Response status={status}, {} body bytes", body.len());

        Ok(ApiResponse {
            status,
            body,
            cookie,
        })
    }
}

impl QBittorrentOps for HttpOps {
    async fn login(&self, username: &str, password: &str) -> Result<ApiResponse, PortSyncError> {
        let url = self.endpoint(LOGIN_PATH);
        debug!("POST {url}");
        let request = self
            .http
            .post(url)
            .form(&[("username", username), ("password", password)]);
        self.send(request).await
    }

    async fn call(
        &self,
        call: ApiCall,
        session: Option<SessionCookie>,
    ) -> Result<ApiResponse, PortSyncError> {
        let request = match &call {
            ApiCall::Preferences => {
                let url = self.endpoint(PREFERENCES_PATH);
                debug!("GET {url}");
                self.http.get(url)
            }
            ApiCall::SetPreferences { json } => {
                let url = self.endpoint(SET_PREFERENCES_PATH);
                debug!("POST {url} json={json}");
                self.http.post(url).form(&[("json", json.as_str())])
            }
        };
        let request = match session {
            Some(cookie) => request.header(COOKIE, cookie.0),
            None => request,
        };
        self.send(request).await
    }
}

/// Extracts the first `name=value` pair set by the response.
fn session_cookie(headers: &HeaderMap) -> Option<SessionCookie> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| matches!(pair.split_once('='), Some((name, value)) if !name.is_empty() && !value.is_empty()))
        .map(SessionCookie::new)
}
