//! HTML rewriting passes.
//!
//! Each pass is a regex substitution over the raw document text:
//! 1. quoted `href`, `src`, `action`, `poster` and `data` attribute values
//! 2. every candidate of a `srcset` list
//! 3. every CSS `url(...)` occurrence, wherever it appears
//! 4. a `<base href>` after the first `<head>` tag
//!
//! There is no parse tree. Markup outside the matched spans is emitted
//! byte-for-byte, malformed documents are tolerated, and matches inside
//! comments or script bodies are rewritten like any other text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::url::rewrite_url;

/// `<ws>name = "value"` for the single-URL attributes. Quoted values never
/// span a line.
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s(?:href|src|action|poster|data)\s*=\s*)(?:"([^"\n]*)"|'([^'\n]*)')"#)
        .expect("attribute pattern is valid")
});

/// `srcset = "..."`, closed by the first quote of either kind.
static SRCSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(srcset\s*=\s*["'])([^"'\n]*)(["'])"#).expect("srcset pattern is valid")
});

static CSS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)url\(([^)]+)\)").expect("css url pattern is valid"));

static HEAD_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head([^>]*)>").expect("head pattern is valid"));

/// Rewrite every resource reference in `html` to go through the proxy.
///
/// `base_url` must be the final URL the document was served from; relative
/// references are resolved against it and it becomes the injected `<base>`.
pub fn rewrite_html(html: &str, base_url: &str) -> String {
    let output = rewrite_attributes(html, base_url);
    let output = rewrite_srcsets(&output, base_url);
    let output = rewrite_css_urls(&output, base_url);
    inject_base(&output, base_url)
}

fn rewrite_attributes(html: &str, base_url: &str) -> String {
    ATTRIBUTE
        .replace_all(html, |caps: &Captures| {
            let prefix = &caps[1];
            let (quote, value) = match caps.get(2) {
                Some(value) => ('"', value.as_str()),
                None => ('\'', caps.get(3).map_or("", |m| m.as_str())),
            };
            format!("{prefix}{quote}{}{quote}", rewrite_url(value, base_url))
        })
        .into_owned()
}

fn rewrite_srcsets(html: &str, base_url: &str) -> String {
    SRCSET
        .replace_all(html, |caps: &Captures| {
            format!(
                "{}{}{}",
                &caps[1],
                rewrite_srcset_value(&caps[2], base_url),
                &caps[3]
            )
        })
        .into_owned()
}

/// Rewrite a `srcset` list: `url [descriptor], url [descriptor], ...`.
fn rewrite_srcset_value(value: &str, base_url: &str) -> String {
    value
        .split(',')
        .map(|candidate| {
            let mut tokens = candidate.split_whitespace();
            let Some(url) = tokens.next() else {
                return candidate.to_string();
            };
            let proxied = rewrite_url(url, base_url);
            match tokens.next() {
                Some(descriptor) => format!("{proxied} {descriptor}"),
                None => proxied,
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn rewrite_css_urls(html: &str, base_url: &str) -> String {
    CSS_URL
        .replace_all(html, |caps: &Captures| {
            let inner = strip_quotes(caps[1].trim());
            format!("url(\"{}\")", rewrite_url(inner, base_url))
        })
        .into_owned()
}

/// Drop one leading and one trailing quote character, of either kind.
fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
    value.strip_suffix(['"', '\'']).unwrap_or(value)
}

fn inject_base(html: &str, base_url: &str) -> String {
    HEAD_OPEN
        .replacen(html, 1, |caps: &Captures| {
            format!("<head{}><base href=\"{}\">", &caps[1], base_url)
        })
        .into_owned()
}
