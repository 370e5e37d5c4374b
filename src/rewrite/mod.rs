//! Document rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! upstream HTML body + final URL
//!     → html.rs (attribute, srcset, css url() passes, <base> injection)
//!     → url.rs (resolve each reference, classify, wrap in proxy URL)
//!     → rewritten HTML text
//! ```
//!
//! # Design Decisions
//! - Textual passes over the document, no parse tree
//! - Fail-open: a reference that cannot be resolved is left as written
//! - Only http/https targets are routed back through the proxy

pub mod html;
pub mod url;

pub use self::html::rewrite_html;
pub use self::url::{is_fetchable_url, rewrite_url, to_proxy_url, PROXY_PATH};
