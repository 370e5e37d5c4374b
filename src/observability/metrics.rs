//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_rewritten_documents_total` (counter): HTML documents rewritten
//! - `proxy_rewritten_bytes_total` (counter): bytes of rewritten HTML sent
//! - `proxy_rewrite_growth_bytes` (histogram): rewritten minus original size

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished proxy request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("proxy_requests_total", &labels).increment(1);
    metrics::histogram!("proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record one rewritten HTML document.
pub fn record_rewrite(original_bytes: usize, rewritten_bytes: usize) {
    metrics::counter!("proxy_rewritten_documents_total").increment(1);
    metrics::counter!("proxy_rewritten_bytes_total").increment(rewritten_bytes as u64);
    metrics::histogram!("proxy_rewrite_growth_bytes")
        .record(rewritten_bytes as f64 - original_bytes as f64);
}
