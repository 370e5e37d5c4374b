//! Header filtering in both directions of the relay.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers from requests and responses
//! - Strip `host` so the client sets it for the upstream target
//! - Force `accept-encoding: identity` so bodies can be rewritten
//! - Strip response headers that would block the proxied page
//!   (CSP and `x-frame-options`)
//!
//! # Design Decisions
//! - `content-length` is treated as hop-by-hop; the body is re-framed on
//!   both legs
//! - Multi-valued headers keep every value

use axum::http::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, HOST};

/// Headers meaningful for a single connection only.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Response headers that would stop the proxied page loading its rewritten
/// sub-resources or being framed.
pub const BLOCKED_RESPONSE_HEADERS: &[&str] = &[
    "content-security-policy",
    "content-security-policy-report-only",
    "x-frame-options",
];

/// Returns true if `name` is a hop-by-hop header. Header names from
/// `HeaderMap` are already lowercase.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Returns true if `name` must not reach the client.
pub fn is_blocked_response_header(name: &str) -> bool {
    BLOCKED_RESPONSE_HEADERS
        .iter()
        .any(|blocked| blocked.eq_ignore_ascii_case(name))
}

/// Headers to send upstream for an inbound request.
pub fn upstream_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_hop_by_hop(name.as_str()) || *name == HOST {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    headers
}

/// Headers to relay to the client for an upstream response.
pub fn client_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name.as_str()) || is_blocked_response_header(name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
