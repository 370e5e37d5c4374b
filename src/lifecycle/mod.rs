//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → metrics exporter → upstream client → bind → serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → server stops accepting → in-flight requests drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, StartupError};
