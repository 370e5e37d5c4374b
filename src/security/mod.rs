//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (drop hop-by-hop + host, force identity encoding)
//!     → Forward upstream
//!
//! Upstream response:
//!     → headers.rs (drop hop-by-hop + framing/CSP policies)
//!     → Relay to client
//! ```
//!
//! # Design Decisions
//! - Header sets are static data, shared read-only by every request
//! - Filtering is a pure function: HeaderMap → HeaderMap

pub mod headers;

pub use headers::{client_response_headers, upstream_request_headers};
