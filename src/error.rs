//! Relay error taxonomy and its HTTP mapping.
//!
//! | Variant    | Cause                                   | Status |
//! |------------|-----------------------------------------|--------|
//! | `Connect`  | refused connection, DNS failure         | 502    |
//! | `Upstream` | malformed response, protocol violation  | 502    |
//! | `Timeout`  | backend exceeded the call bound         | 504    |
//! | `Internal` | fault inside the proxy itself           | 500    |
//!
//! Error bodies carry the inbound URL and a timestamp, never the prerender
//! token or the prerender service address.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failure of a single relayed call.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("backend unreachable: {0}")]
    Connect(String),

    #[error("backend did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("invalid response from backend: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Connect(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ProxyError::Connect(_) | ProxyError::Upstream(_) => "Bad Gateway: Proxy error",
            ProxyError::Timeout(_) => "Gateway Timeout",
            ProxyError::Internal(_) => "Internal Server Error",
        }
    }

    /// Attach the inbound URL so the error can be rendered.
    pub fn with_url(self, url: impl Into<String>) -> ErrorResponse {
        ErrorResponse {
            error: self,
            url: url.into(),
        }
    }
}

impl From<hyper_util::client::legacy::Error> for ProxyError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        if err.is_connect() {
            ProxyError::Connect(describe(&err))
        } else {
            ProxyError::Upstream(describe(&err))
        }
    }
}

impl From<axum::http::Error> for ProxyError {
    fn from(err: axum::http::Error) -> Self {
        ProxyError::Internal(err.to_string())
    }
}

/// Error message including the innermost source.
fn describe(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message = format!("{}: {}", message, inner);
        source = inner.source();
    }
    message
}

/// A `ProxyError` bound to the request it failed.
#[derive(Debug)]
pub struct ErrorResponse {
    pub error: ProxyError,
    pub url: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    url: &'a str,
    timestamp: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error.title(),
            message: self.error.to_string(),
            url: &self.url,
            timestamp: crate::http::internal::timestamp(),
        };
        (self.error.status(), Json(body)).into_response()
    }
}
