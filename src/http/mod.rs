//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (assign/propagate request ID)
//!     → /api/proxy → relay (validate, forward, rewrite)
//!     → /health    → status JSON
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
