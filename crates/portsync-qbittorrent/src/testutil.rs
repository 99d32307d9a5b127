//! Shared test utilities and fixtures.

use reqwest::StatusCode;

use crate::ops::{ApiResponse, SessionCookie};

pub(crate) fn response(status: StatusCode, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
        cookie: None,
    }
}

pub(crate) fn forbidden() -> ApiResponse {
    response(StatusCode::FORBIDDEN, "Forbidden")
}

pub(crate) fn login_ok(cookie: &str) -> ApiResponse {
    ApiResponse {
        cookie: Some(SessionCookie::new(cookie)),
        ..response(StatusCode::OK, "Ok.")
    }
}

pub(crate) fn preferences_ok(port: u16) -> ApiResponse {
    response(StatusCode::OK, &preferences_body(port))
}

/// A trimmed down but realistic preferences document.
pub(crate) fn preferences_body(port: u16) -> String {
    format!(
        r#"{{"add_trackers":"","alt_dl_limit":10240,"dht":true,"listen_port":{port},"locale":"en","max_connec":500,"random_port":false,"upnp":false,"web_ui_port":8080}}"#
    )
}
