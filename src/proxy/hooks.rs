//! Transformation hooks applied around a relayed call.
//!
//! The relay runs the shared steps (target URI, `Host`, forwarding headers,
//! hop-by-hop stripping) and then gives a `RelayHooks` implementation the
//! chance to adjust the outbound request head and the inbound response head.
//! Hooks are plain values chosen per call by the dispatcher.

use axum::http::{request, response};

use crate::http::response::rewrite_page_headers;
use crate::proxy::target::PrerenderTarget;

pub static X_PRERENDER_TOKEN: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-prerender-token");

/// Per-call facts the hooks may read.
#[derive(Debug, Clone)]
pub struct RelayContext {
    /// Inbound path, without the query string.
    pub path: String,
}

/// Adjusts request and response heads around one relayed call.
pub trait RelayHooks: Send + Sync {
    /// Last change to the outbound request head before it is sent.
    fn before_send(&self, parts: request::Parts, _ctx: &RelayContext) -> request::Parts {
        parts
    }

    /// First change to the response head after hop-by-hop headers are stripped.
    fn after_receive(&self, parts: response::Parts, _ctx: &RelayContext) -> response::Parts {
        parts
    }
}

/// Pass-through relay to the origin (static assets, API calls).
#[derive(Debug, Clone, Copy, Default)]
pub struct Transparent;

impl RelayHooks for Transparent {}

/// Origin relay for page candidates: applies the page rewrite rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRewrite;

impl RelayHooks for PageRewrite {
    fn after_receive(&self, mut parts: response::Parts, ctx: &RelayContext) -> response::Parts {
        rewrite_page_headers(&ctx.path, &mut parts.headers);
        parts
    }
}

/// Prerender relay: adds the service token, returns the rendering untouched.
#[derive(Debug, Clone, Copy)]
pub struct PrerenderAuth<'a> {
    pub target: &'a PrerenderTarget,
}

impl RelayHooks for PrerenderAuth<'_> {
    fn before_send(&self, mut parts: request::Parts, _ctx: &RelayContext) -> request::Parts {
        parts.headers.remove(&X_PRERENDER_TOKEN);
        if let Some(token) = self.target.token() {
            parts.headers.insert(X_PRERENDER_TOKEN.clone(), token.clone());
        }
        parts
    }
}
