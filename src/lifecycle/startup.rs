//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last, once the upstream client exists

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Start the proxy and serve until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
