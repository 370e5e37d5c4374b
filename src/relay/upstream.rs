//! Outbound client for upstream fetches.
//!
//! # Responsibilities
//! - Build the upstream request from a validated [`ProxyRequest`]
//! - Follow redirects so only the final response is relayed
//! - Map network failures to [`ProxyError::UpstreamUnreachable`]
//!
//! # Design Decisions
//! - One shared `reqwest::Client` (connection pooling), immutable after startup
//! - Connect and total timeouts from config, so a stalled upstream is a 502
//! - Never retried

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::relay::request::ProxyRequest;
use crate::security::headers::upstream_request_headers;

/// Shared HTTP client used for every upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    /// Build the client from configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let redirects = match config.upstream.max_redirects {
            0 => Policy::none(),
            max => Policy::limited(max),
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .pool_idle_timeout(Duration::from_secs(config.upstream.pool_idle_timeout_secs))
            .redirect(redirects);

        if let Some(user_agent) = &config.upstream.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if !config.upstream.use_env_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build()?;
        tracing::debug!(
            max_redirects = config.upstream.max_redirects,
            connect_timeout_secs = config.timeouts.connect_secs,
            request_timeout_secs = config.timeouts.request_secs,
            "Upstream client initialized"
        );
        Ok(Self { client })
    }

    /// Send a request upstream and wait for the final response head.
    pub async fn send(&self, request: ProxyRequest) -> Result<reqwest::Response, ProxyError> {
        let ProxyRequest {
            method,
            target,
            headers,
            body,
        } = request;

        let mut builder = self
            .client
            .request(method, target.clone())
            .headers(upstream_request_headers(&headers));
        if let Some(body) = body {
            builder = builder.body(body);
        }

        match builder.send().await {
            Ok(response) => {
                tracing::debug!(
                    target = %target,
                    final_url = %response.url(),
                    status = %response.status(),
                    "Upstream responded"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::error!(target = %target, error = %e, "Upstream error");
                Err(ProxyError::UpstreamUnreachable(e))
            }
        }
    }
}
