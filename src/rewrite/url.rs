//! URL classification and proxy reference construction.
//!
//! # Responsibilities
//! - Decide whether a string is a fetchable absolute http(s) URL
//! - Resolve a document reference against the document base
//! - Encode fetchable targets as proxy-relative references
//!
//! # Design Decisions
//! - Resolution follows the WHATWG URL standard via the `url` crate
//! - Anything ambiguous is returned as written, never as an error

use ::url::Url;

/// Path of the proxy endpoint. Part of the rewritten link format.
pub const PROXY_PATH: &str = "/api/proxy";

/// Prefix shared by every reference this module produces.
const PROXY_REFERENCE_PREFIX: &str = "/api/proxy?url=";

/// Reference prefixes that are never network fetches.
const NON_FETCHABLE_PREFIXES: &[&str] = &["#", "data:", "javascript:", "mailto:", "tel:"];

/// Outcome of rewriting a single reference.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rewrite {
    /// Reference now points through the proxy.
    Proxied(String),
    /// Reference is left exactly as written (after trimming).
    Original,
}

/// Returns true if `candidate` parses as an absolute URL with an http or https scheme.
pub fn is_fetchable_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| is_http_scheme(&url))
        .unwrap_or(false)
}

/// Build the proxy-relative reference for an absolute target URL.
pub fn to_proxy_url(target: &str) -> String {
    format!("{}{}", PROXY_REFERENCE_PREFIX, urlencoding::encode(target))
}

/// Rewrite a raw attribute/CSS reference so it is fetched through the proxy.
///
/// `base` is the absolute URL the reference is resolved against. Returns the
/// trimmed input unchanged when the reference is empty, uses a non-fetchable
/// scheme, cannot be resolved, or resolves to something other than http(s).
pub fn rewrite_url(raw: &str, base: &str) -> String {
    let candidate = raw.trim();
    match classify(candidate, base) {
        Rewrite::Proxied(reference) => reference,
        Rewrite::Original => candidate.to_string(),
    }
}

fn classify(candidate: &str, base: &str) -> Rewrite {
    if candidate.is_empty() {
        return Rewrite::Original;
    }
    if NON_FETCHABLE_PREFIXES
        .iter()
        .any(|prefix| candidate.starts_with(prefix))
    {
        return Rewrite::Original;
    }
    // Already routed through the proxy; resolving it again would nest it.
    if candidate.starts_with(PROXY_REFERENCE_PREFIX) {
        return Rewrite::Original;
    }

    let resolved = match Url::parse(base).and_then(|base| base.join(candidate)) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::trace!(reference = %candidate, error = %e, "Leaving unresolvable reference");
            return Rewrite::Original;
        }
    };

    if !is_fetchable_url(resolved.as_str()) {
        return Rewrite::Original;
    }

    Rewrite::Proxied(to_proxy_url(resolved.as_str()))
}

fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
