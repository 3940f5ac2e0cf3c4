//! The forwarder: relays one inbound request to the origin or the prerender
//! service and streams the answer back.
//!
//! # Relay steps
//! ```text
//! inbound request
//!     → same method, path + query verbatim, target URI
//!     → body piped for POST/PUT/PATCH, dropped otherwise
//!     → security::headers::prepare_outbound (Host, hop-by-hop, X-Forwarded-*)
//!     → hooks.before_send
//!     → client.request under resilience::timeouts
//!     → strip hop-by-hop from the response
//!     → hooks.after_receive
//!     → stream body to the client under the idle deadline
//! ```
//!
//! # Design Decisions
//! - Exactly one outbound call per inbound request
//! - The timeout bounds the wait for the response head and, as an idle
//!   deadline, every gap between body frames; a stall or failure after the
//!   head was sent can only reset the client connection
//! - Redirects are never followed: a 3xx is handed to the client, which
//!   issues the next request itself
//! - Dropping the returned future (client went away) drops the outbound call

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, Uri, Version};

use crate::error::ProxyError;
use crate::proxy::client::HttpClient;
use crate::proxy::hooks::{PageRewrite, PrerenderAuth, RelayContext, RelayHooks, Transparent};
use crate::proxy::target::{PrerenderTarget, UpstreamTarget};
use crate::resilience::timeouts::{with_timeout, IdleTimeoutBody};
use crate::security::headers::{prepare_outbound, strip_hop_by_hop, ForwardedFor};

/// Which backend a relayed call went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayTarget {
    Origin,
    Prerender,
}

impl RelayTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayTarget::Origin => "origin",
            RelayTarget::Prerender => "prerender",
        }
    }
}

/// Methods whose body is relayed.
pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Relays requests to the configured origin and prerender service.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    upstream: Arc<UpstreamTarget>,
    prerender: Arc<PrerenderTarget>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(
        client: HttpClient,
        upstream: UpstreamTarget,
        prerender: PrerenderTarget,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            upstream: Arc::new(upstream),
            prerender: Arc::new(prerender),
            timeout,
        }
    }

    pub fn upstream(&self) -> &UpstreamTarget {
        &self.upstream
    }

    pub fn prerender(&self) -> &PrerenderTarget {
        &self.prerender
    }

    /// Relay to the origin without touching the response head.
    pub async fn relay_transparent(
        &self,
        req: Request<Body>,
        client_addr: SocketAddr,
    ) -> Result<Response<Body>, ProxyError> {
        let uri = self.upstream.uri_for(path_and_query(req.uri()))?;
        let authority = self.upstream.authority();
        self.relay(req, client_addr, uri, &authority, &Transparent).await
    }

    /// Relay a page request to the origin and apply the page rewrite rules.
    pub async fn relay_page(
        &self,
        req: Request<Body>,
        client_addr: SocketAddr,
    ) -> Result<Response<Body>, ProxyError> {
        let uri = self.upstream.uri_for(path_and_query(req.uri()))?;
        let authority = self.upstream.authority();
        self.relay(req, client_addr, uri, &authority, &PageRewrite).await
    }

    /// Relay a crawler's page request to the prerender service.
    pub async fn relay_prerender(
        &self,
        req: Request<Body>,
        client_addr: SocketAddr,
    ) -> Result<Response<Body>, ProxyError> {
        let uri = self
            .prerender
            .render_uri(&self.upstream, path_and_query(req.uri()))?;
        let hooks = PrerenderAuth {
            target: &self.prerender,
        };
        self.relay(req, client_addr, uri, self.prerender.authority(), &hooks)
            .await
    }

    /// The relay algorithm shared by every backend call.
    pub async fn relay<H: RelayHooks>(
        &self,
        req: Request<Body>,
        client_addr: SocketAddr,
        uri: Uri,
        authority: &str,
        hooks: &H,
    ) -> Result<Response<Body>, ProxyError> {
        let (mut parts, body) = req.into_parts();
        let ctx = RelayContext {
            path: parts.uri.path().to_string(),
        };

        let original_host = parts.headers.get(header::HOST).cloned();
        let forwarded = ForwardedFor {
            client_ip: client_addr.ip(),
            original_host: original_host.as_ref(),
        };
        prepare_outbound(&mut parts.headers, authority, &forwarded);

        let body = if carries_body(&parts.method) {
            body
        } else {
            parts.headers.remove(header::CONTENT_LENGTH);
            Body::empty()
        };

        parts.uri = uri;
        parts.version = Version::HTTP_11;
        let parts = hooks.before_send(parts, &ctx);
        let outbound = Request::from_parts(parts, body);

        let response = with_timeout(self.timeout, async {
            self.client.request(outbound).await.map_err(ProxyError::from)
        })
        .await?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        if parts.status.is_redirection() {
            if let Some(location) = parts.headers.get(header::LOCATION) {
                tracing::debug!(
                    status = %parts.status,
                    location = ?location,
                    path = %ctx.path,
                    "Relaying redirect to client"
                );
            }
        }

        let parts = hooks.after_receive(parts, &ctx);
        Ok(Response::from_parts(
            parts,
            Body::new(IdleTimeoutBody::new(body, self.timeout)),
        ))
    }
}

/// Path and query of a URI, `/` when empty.
pub fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")
}
