//! Inbound request validation.
//!
//! # Responsibilities
//! - Extract and validate the `url` query parameter
//! - Buffer the inbound body for methods that carry one
//!
//! # Design Decisions
//! - Validation happens before the body is read or anything is sent upstream
//! - The first `url` parameter wins when several are given

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request},
};
use url::Url;

use crate::error::ProxyError;
use crate::rewrite::is_fetchable_url;

/// A validated request to relay.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    /// Absolute http(s) target.
    pub target: Url,
    /// Inbound headers, unfiltered.
    pub headers: HeaderMap,
    /// Buffered body; `None` for GET and HEAD.
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    /// Validate the target and buffer the body of an inbound request.
    pub async fn from_request(request: Request<Body>) -> Result<Self, ProxyError> {
        let target = target_from_query(request.uri().query())?;
        let (parts, body) = request.into_parts();

        let body = if carries_body(&parts.method) {
            let bytes = axum::body::to_bytes(body, usize::MAX)
                .await
                .map_err(ProxyError::RequestBody)?;
            Some(bytes)
        } else {
            None
        };

        Ok(Self {
            method: parts.method,
            target,
            headers: parts.headers,
            body,
        })
    }
}

/// Pull the target URL out of a raw query string.
pub fn target_from_query(query: Option<&str>) -> Result<Url, ProxyError> {
    let raw = query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "url")
                .map(|(_, value)| value.into_owned())
        })
        .ok_or(ProxyError::InvalidTargetUrl)?;

    if !is_fetchable_url(&raw) {
        return Err(ProxyError::InvalidTargetUrl);
    }
    Url::parse(&raw).map_err(|_| ProxyError::InvalidTargetUrl)
}

fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}
