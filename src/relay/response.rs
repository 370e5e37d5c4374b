//! Client response assembly.
//!
//! # Responsibilities
//! - Mirror the upstream status
//! - Relay upstream headers minus hop-by-hop and blocked headers
//! - Rewrite HTML bodies against the final URL; pass everything else through
//!
//! # Design Decisions
//! - HTML detection is a case-insensitive substring match on `content-type`
//! - Rewritten HTML is always served as `text/html; charset=utf-8`
//! - The stale upstream `content-length` never reaches the client; the
//!   server frames the buffered body itself

use axum::{
    body::Body,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::Response,
};

use crate::error::ProxyError;
use crate::observability::metrics;
use crate::rewrite::rewrite_html;
use crate::security::headers::client_response_headers;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Returns true if a `content-type` value denotes an HTML document.
pub fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

/// Turn the upstream response into the response sent to the client.
pub async fn into_client_response(upstream: reqwest::Response) -> Result<Response, ProxyError> {
    let status = upstream.status();
    let headers = client_response_headers(upstream.headers());
    let final_url = upstream.url().to_string();

    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();

    if is_html_content_type(&content_type) {
        let html = upstream.text().await.map_err(ProxyError::UpstreamBody)?;
        Ok(html_response(status, headers, &html, &final_url))
    } else {
        let bytes = upstream.bytes().await.map_err(ProxyError::UpstreamBody)?;
        Ok(build_response(status, headers, Body::from(bytes)))
    }
}

/// Rewrite an HTML document and build its client response.
pub fn html_response(status: StatusCode, mut headers: HeaderMap, html: &str, final_url: &str) -> Response {
    let rewritten = rewrite_html(html, final_url);
    metrics::record_rewrite(html.len(), rewritten.len());
    tracing::debug!(
        base = %final_url,
        original_bytes = html.len(),
        rewritten_bytes = rewritten.len(),
        "Rewrote HTML document"
    );

    headers.insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    headers.remove(CONTENT_LENGTH);
    build_response(status, headers, Body::from(rewritten))
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
