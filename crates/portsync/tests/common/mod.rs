//! An in-process stand-in for the qBittorrent WebUI API v2.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    Form, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

pub(crate) const USERNAME: &str = "admin";
pub(crate) const PASSWORD: &str = "adminadmin";

/// Everything the fake server knows and counts.
#[derive(Debug, Default)]
pub(crate) struct WebUiState {
    pub(crate) listen_port: u16,
    /// The only session id accepted, if any.
    pub(crate) valid_session: Option<String>,
    pub(crate) sessions_issued: usize,
    pub(crate) logins: usize,
    pub(crate) reads: usize,
    /// `json` form fields of every accepted setPreferences call.
    pub(crate) writes: Vec<String>,
}

type SharedState = Arc<Mutex<WebUiState>>;

/// Handle to a running fake WebUI.
#[derive(Debug, Clone)]
pub(crate) struct FakeWebUi {
    pub(crate) url: String,
    state: SharedState,
}

impl FakeWebUi {
    pub(crate) async fn start(listen_port: u16) -> Self {
        let state = Arc::new(Mutex::new(WebUiState {
            listen_port,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/api/v2/auth/login", post(login))
            .route("/api/v2/app/preferences", get(preferences))
            .route("/api/v2/app/setPreferences", post(set_preferences))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, WebUiState> {
        self.state.lock().unwrap()
    }

    /// Sends a setPreferences request with a hand-built, already form-encoded body and returns
    /// the raw HTTP response.
    pub(crate) async fn raw_set_preferences(&self, session: &str, form_body: &str) -> String {
        let addr = self.url.trim_start_matches("http://");
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST /api/v2/app/setPreferences HTTP/1.1\r\nHost: {addr}\r\nCookie: SID={session}\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{form_body}",
            form_body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    /// Forgets the current session, as qBittorrent does when it times out.
    pub(crate) fn expire_session(&self) {
        self.state().valid_session = None;
    }
}

fn has_valid_session(state: &WebUiState, headers: &HeaderMap) -> bool {
    let Some(valid) = &state.valid_session else {
        return false;
    };
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .any(|pair| pair.trim() == format!("SID={valid}"))
}

async fn login(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.logins += 1;

    if !headers.contains_key(header::REFERER) {
        return (StatusCode::UNAUTHORIZED, "missing referer").into_response();
    }
    let accepted = form.get("username").map(String::as_str) == Some(USERNAME)
        && form.get("password").map(String::as_str) == Some(PASSWORD);
    if !accepted {
        return (StatusCode::OK, "Fails.").into_response();
    }

    state.sessions_issued += 1;
    let session = format!("session-{}", state.sessions_issued);
    state.valid_session = Some(session.clone());
    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            format!("SID={session}; HttpOnly; SameSite=Strict; path=/"),
        )],
        "Ok.",
    )
        .into_response()
}

async fn preferences(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut state = state.lock().unwrap();
    if !has_valid_session(&state, &headers) {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }
    state.reads += 1;

    let body = serde_json::json!({
        "dht": true,
        "listen_port": state.listen_port,
        "max_connec": 500,
        "upnp": false,
        "web_ui_port": 8080,
    });
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

async fn set_preferences(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    if !has_valid_session(&state, &headers) {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    let Some(json) = form.get("json") else {
        return (StatusCode::BAD_REQUEST, "missing json").into_response();
    };
    let Ok(update) = serde_json::from_str::<serde_json::Value>(json) else {
        return (StatusCode::BAD_REQUEST, "bad json").into_response();
    };
    if let Some(port) = update.get("listen_port").and_then(serde_json::Value::as_u64) {
        let Ok(port) = u16::try_from(port) else {
            return (StatusCode::BAD_REQUEST, "listen_port out of range").into_response();
        };
        state.listen_port = port;
    }
    state.writes.push(json.clone());
    StatusCode::OK.into_response()
}
