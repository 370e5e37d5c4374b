//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener and shut down gracefully
//! - Dispatch `/api/proxy` requests to the relay

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::request::{MakeRequestUuidV4, RequestIdExt};
use crate::observability::metrics;
use crate::relay::{self, UpstreamClient};
use crate::rewrite::PROXY_PATH;

/// Extra time the server-side timeout allows beyond the upstream timeout.
const SERVER_TIMEOUT_GRACE_SECS: u64 = 5;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
}

/// HTTP server for the rewriting proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let state = AppState {
            upstream: UpstreamClient::new(&config)?,
        };
        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        // Outlives the upstream client timeout so upstream stalls surface as 502.
        let server_timeout =
            Duration::from_secs(config.timeouts.request_secs + SERVER_TIMEOUT_GRACE_SECS);

        Router::new()
            .route(PROXY_PATH, any(proxy_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                server_timeout,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            proxy_path = PROXY_PATH,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving the server without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id();
    let method = request.method().to_string();

    let response = match relay::relay(&state.upstream, request).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    tracing::info!(
        request_id = %request_id,
        method = %method,
        status = response.status().as_u16(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Proxied request"
    );
    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub version: &'static str,
    pub status: &'static str,
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "ok",
    })
}
