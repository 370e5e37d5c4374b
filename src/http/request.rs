//! Request ID assignment.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID when the client sent none
//! - Expose the ID to handlers for log correlation
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept and forwarded upstream

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates random UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Access to the request ID assigned by the middleware.
pub trait RequestIdExt {
    /// The request ID, or `"unknown"` when none was assigned.
    fn request_id(&self) -> String;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> String {
        self.extensions()
            .get::<RequestId>()
            .map(RequestId::header_value)
            .or_else(|| self.headers().get(X_REQUEST_ID))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string()
    }
}
