//! Rewriting forward proxy library.
//!
//! Fetches an arbitrary http(s) resource for a browser and, for HTML,
//! rewrites every resource reference so follow-up requests come back
//! through `/api/proxy?url=...`.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod rewrite;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
