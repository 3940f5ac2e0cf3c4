//! Response header rewriting for relayed pages.
//!
//! # Responsibilities
//! - Force `text/html; charset=utf-8` on HTML document routes
//! - Repair a missing or generic content type on script, style and JSON paths
//! - Disable caching of dynamic HTML shells
//!
//! # Design Decisions
//! - Runs only on origin responses to page candidates; static, API and
//!   prerender responses keep their headers untouched
//! - Content type is only replaced when missing or already HTML, so a page
//!   route that legitimately returns JSON keeps it

use axum::http::header::{self, HeaderMap, HeaderValue};

use crate::routing::classifier::{is_page_like, is_static_asset, API_PREFIX};

pub const HTML_UTF8: &str = "text/html; charset=utf-8";
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// Apply the page rewrite rules for a response to `path`.
pub fn rewrite_page_headers(path: &str, headers: &mut HeaderMap) {
    if is_static_asset(path) || path.starts_with(API_PREFIX) {
        return;
    }

    if is_page_like(path) {
        let html = headers
            .get(header::CONTENT_TYPE)
            .map_or(true, |v| v.to_str().is_ok_and(|ct| ct.contains("text/html")));
        if html {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_UTF8));
        }
        disable_caching(headers);
    } else if let Some(mime) = mime_for_extension(path) {
        let generic = headers
            .get(header::CONTENT_TYPE)
            .map_or(true, |v| v.to_str().is_ok_and(|ct| ct.starts_with("text/plain")));
        if generic {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
        }
    }
}

fn disable_caching(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
}

/// MIME type for script, style and JSON paths, extension matched case-insensitively.
fn mime_for_extension(path: &str) -> Option<&'static str> {
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "js" => Some("application/javascript; charset=utf-8"),
        "css" => Some("text/css; charset=utf-8"),
        "json" => Some("application/json"),
        _ => None,
    }
}
