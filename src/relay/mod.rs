//! Request relay subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (/api/proxy?url=...)
//!     → request.rs (validate target, buffer body)      400 on bad target
//!     → upstream.rs (filtered headers, follow redirects) 502 on network error
//!     → response.rs (filter headers, rewrite HTML or pass bytes through)
//!     → Client response
//! ```
//!
//! # Design Decisions
//! - One linear pipeline per request, no shared mutable state
//! - Bodies are fully buffered; HTML must be complete before rewriting
//! - No retries: a failed upstream call is reported immediately
//! - The final URL after redirects is the base for rewriting

pub mod request;
pub mod response;
pub mod upstream;

use axum::{body::Body, http::Request, response::Response};

use crate::error::ProxyError;

pub use request::{target_from_query, ProxyRequest};
pub use response::{into_client_response, is_html_content_type};
pub use upstream::UpstreamClient;

/// Run one inbound request through the relay.
pub async fn relay(client: &UpstreamClient, request: Request<Body>) -> Result<Response, ProxyError> {
    let proxy_request = ProxyRequest::from_request(request).await?;

    tracing::debug!(
        method = %proxy_request.method,
        target = %proxy_request.target,
        body_bytes = proxy_request.body.as_ref().map_or(0, |b| b.len()),
        "Forwarding request upstream"
    );

    let upstream = client.send(proxy_request).await?;
    into_client_response(upstream).await
}
