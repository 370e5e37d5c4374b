//! Request-level errors and their client responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors that end a proxied request early.
///
/// Per-reference rewrite failures are not represented here; the rewriter
/// leaves such references as written.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The `url` query parameter is missing or not an absolute http(s) URL.
    #[error("Invalid or missing url query. Use /api/proxy?url=https://example.com")]
    InvalidTargetUrl,

    /// The inbound request body could not be read, e.g. a stream over the size limit.
    #[error("Failed to read request body")]
    RequestBody(#[source] axum::Error),

    /// DNS, connect, TLS or timeout failure talking to the upstream.
    #[error("Failed to reach upstream URL")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// The upstream answered but its body could not be read.
    #[error("Failed to read upstream response")]
    UpstreamBody(#[source] reqwest::Error),
}

/// JSON body sent to the client for every [`ProxyError`].
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProxyError {
    /// Status code reported to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidTargetUrl => StatusCode::BAD_REQUEST,
            ProxyError::RequestBody(_)
            | ProxyError::UpstreamUnreachable(_)
            | ProxyError::UpstreamBody(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Underlying cause, flattened with its source chain.
    pub fn detail(&self) -> Option<String> {
        let source = std::error::Error::source(self)?;
        let mut detail = source.to_string();
        let mut next = source.source();
        while let Some(cause) = next {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            next = cause.source();
        }
        Some(detail)
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            detail: self.detail(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, detail = ?self.detail(), "Upstream failure");
        } else {
            tracing::debug!(error = %self, "Rejected proxy request");
        }
        (status, Json(self.body())).into_response()
    }
}
