//! Structured logging.
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    format!("rewrite_proxy={level},tower_http={level}")
}

/// Install the global tracing subscriber. Call once, early in `main`.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
