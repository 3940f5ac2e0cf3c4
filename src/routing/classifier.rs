//! Request classification.
//!
//! # Responsibilities
//! - Map every inbound request to exactly one `RouteDecision`
//! - Recognize internal endpoints, static assets and API calls
//! - Provide the page-like predicate used by the response rewrite rules
//!
//! # Design Decisions
//! - Pure and total: no I/O, no failure mode, same input gives same decision
//! - First match wins; internal endpoints are checked before the static
//!   extension rule so that `/manifest.json` is served locally
//! - Classification looks at the path only, never at the query string
//! - Extension matching is case-sensitive

use std::fmt;

use axum::http::Request;

/// Extensions that mark a path as a static asset.
pub const STATIC_EXTENSIONS: &[&str] = &[
    "js", "css", "png", "jpg", "jpeg", "gif", "svg", "ico", "woff", "woff2", "ttf", "eot",
    "json", "xml", "txt", "map",
];

/// Path prefixes reserved for static files.
pub const STATIC_PREFIXES: &[&str] = &["/static/", "/assets/", "/public/"];

/// Prefix of the upstream API.
pub const API_PREFIX: &str = "/api/";

/// Endpoints answered by the proxy itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalPage {
    /// `/health`: JSON liveness payload.
    Health,
    /// `/prerender-test`: diagnostic HTML page.
    PrerenderTest,
    /// `/manifest.json`: web-app manifest.
    Manifest,
}

impl InternalPage {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/health" => Some(InternalPage::Health),
            "/manifest.json" => Some(InternalPage::Manifest),
            p if p.starts_with("/prerender-test") => Some(InternalPage::PrerenderTest),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InternalPage::Health => "health",
            InternalPage::PrerenderTest => "prerender-test",
            InternalPage::Manifest => "manifest",
        }
    }
}

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDecision {
    /// Static file: relay to the origin, never bot-checked, never rewritten.
    StaticBypass,
    /// API call: relay to the origin, never bot-checked, never rewritten.
    ApiBypass,
    /// Served locally.
    InternalPage(InternalPage),
    /// Ordinary page: subject to bot detection.
    PageCandidate,
}

impl RouteDecision {
    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::StaticBypass => "static",
            RouteDecision::ApiBypass => "api",
            RouteDecision::InternalPage(page) => page.as_str(),
            RouteDecision::PageCandidate => "page",
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a request.
pub fn classify<B>(req: &Request<B>) -> RouteDecision {
    classify_path(req.uri().path())
}

/// Classify a request path (query string excluded).
pub fn classify_path(path: &str) -> RouteDecision {
    if let Some(page) = InternalPage::from_path(path) {
        return RouteDecision::InternalPage(page);
    }
    if is_static_asset(path) {
        return RouteDecision::StaticBypass;
    }
    if path.starts_with(API_PREFIX) {
        return RouteDecision::ApiBypass;
    }
    RouteDecision::PageCandidate
}

/// Static extension or static prefix.
pub fn is_static_asset(path: &str) -> bool {
    has_static_extension(path) || STATIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

fn has_static_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| STATIC_EXTENSIONS.contains(&ext))
}

/// Last path segment carries a dotted extension.
pub fn has_extension(path: &str) -> bool {
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

/// HTML document route: `/`, or no extension and outside the API and static trees.
pub fn is_page_like(path: &str) -> bool {
    if is_static_asset(path) || path.starts_with(API_PREFIX) {
        return false;
    }
    path == "/" || !has_extension(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("User-Agent", "GoogleBot")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_static_extensions_bypass() {
        for ext in STATIC_EXTENSIONS {
            let path = format!("/some/file.{}", ext);
            assert_eq!(classify_path(&path), RouteDecision::StaticBypass, "{}", path);
        }
        assert_eq!(classify(&get("/logo.png")), RouteDecision::StaticBypass);
        assert_eq!(
            classify(&get("/logo.png?_escaped_fragment_=")),
            RouteDecision::StaticBypass
        );
    }

    #[test]
    fn test_static_prefixes_bypass() {
        assert_eq!(classify_path("/static/app"), RouteDecision::StaticBypass);
        assert_eq!(classify_path("/assets/fonts/x"), RouteDecision::StaticBypass);
        assert_eq!(classify_path("/public/readme"), RouteDecision::StaticBypass);
        // Prefix needs the trailing slash.
        assert_eq!(classify_path("/statically"), RouteDecision::PageCandidate);
    }

    #[test]
    fn test_api_bypass() {
        assert_eq!(classify(&get("/api/users")), RouteDecision::ApiBypass);
        assert_eq!(
            classify(&get("/api/users?_escaped_fragment_=x")),
            RouteDecision::ApiBypass
        );
        assert_eq!(classify_path("/api"), RouteDecision::PageCandidate);
    }

    #[test]
    fn test_static_rule_wins_over_api() {
        assert_eq!(classify_path("/api/schema.json"), RouteDecision::StaticBypass);
    }

    #[test]
    fn test_internal_pages() {
        assert_eq!(
            classify_path("/health"),
            RouteDecision::InternalPage(InternalPage::Health)
        );
        assert_eq!(
            classify_path("/prerender-test"),
            RouteDecision::InternalPage(InternalPage::PrerenderTest)
        );
        assert_eq!(
            classify_path("/prerender-test/deep"),
            RouteDecision::InternalPage(InternalPage::PrerenderTest)
        );
        // Internal rule runs before the .json static rule.
        assert_eq!(
            classify_path("/manifest.json"),
            RouteDecision::InternalPage(InternalPage::Manifest)
        );
        assert_eq!(classify_path("/healthz"), RouteDecision::PageCandidate);
    }

    #[test]
    fn test_pages() {
        assert_eq!(classify_path("/"), RouteDecision::PageCandidate);
        assert_eq!(classify_path("/tabs/123"), RouteDecision::PageCandidate);
        assert_eq!(classify_path("/docs/guide.pdf"), RouteDecision::PageCandidate);
        // Extension match is case-sensitive.
        assert_eq!(classify_path("/bundle.JS"), RouteDecision::PageCandidate);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let req = get("/learn/chords?x=1");
        assert_eq!(classify(&req), classify(&req));
    }

    #[test]
    fn test_page_like() {
        assert!(is_page_like("/"));
        assert!(is_page_like("/tabs/123"));
        assert!(is_page_like("/v1.2/tabs"));
        assert!(!is_page_like("/docs/guide.pdf"));
        assert!(!is_page_like("/api/users"));
        assert!(!is_page_like("/static/app"));
        assert!(!is_page_like("/app.js"));
    }
}
