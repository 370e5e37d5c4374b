//! Rewriting forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser                         rewrite-proxy                              Origin
//!                     ┌──────────────────────────────────────────────┐
//!  GET /api/proxy ────┼─▶ http::server ─▶ relay::request (validate)  │
//!   ?url=<target>     │                        │                     │
//!                     │                        ▼                     │
//!                     │                  relay::upstream ────────────┼──▶ target
//!                     │              (filtered headers, redirects)   │      │
//!                     │                        │ ◀───────────────────┼──────┘
//!                     │                        ▼                     │
//!  ◀──────────────────┼── relay::response ─▶ rewrite::html           │
//!   rewritten HTML    │  (header filter)      (links → /api/proxy)   │
//!   or raw bytes      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use rewrite_proxy::config::validation::validate_config;
use rewrite_proxy::config::{load_config, ConfigError, ProxyConfig};
use rewrite_proxy::lifecycle;
use rewrite_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "rewrite-proxy")]
#[command(about = "Forward proxy that rewrites HTML links back through itself", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);

    tracing::info!("rewrite-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_file = ?cli.config,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_redirects = config.upstream.max_redirects,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
