//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all dispatcher
//! - Wire up middleware (request ID, tracing, panic isolation)
//! - Classify each request once and pick the forwarder mode
//! - Emit structured events: received, decision, outcome, latency
//! - Serve until the shutdown signal, then drain

use std::any::Any;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::internal::{self, HealthInfo};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::shutdown::wait_for;
use crate::observability::metrics;
use crate::proxy::client::create_http_client;
use crate::proxy::relay::{path_and_query, Forwarder, RelayTarget};
use crate::proxy::target::{PrerenderTarget, TargetError, UpstreamTarget};
use crate::routing::{classify, detect_bot, RouteDecision};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub health: HealthInfo,
    pub serve_verification_page: bool,
}

/// HTTP server for the prerender proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    forwarder: Forwarder,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The origin and prerender targets are resolved here, once.
    pub fn new(config: ProxyConfig) -> Result<Self, TargetError> {
        let upstream = UpstreamTarget::from_config(&config.upstream)?;
        let prerender = PrerenderTarget::from_config(&config.prerender)?;
        let client = create_http_client(&config.timeouts)?;

        let health = HealthInfo {
            port: config.listener.port().unwrap_or(3000),
            has_token: prerender.has_token(),
        };
        let forwarder = Forwarder::new(
            client,
            upstream,
            prerender,
            Duration::from_secs(config.timeouts.request_secs),
        );

        let state = AppState {
            forwarder: forwarder.clone(),
            health,
            serve_verification_page: config.prerender.serve_verification_page,
        };

        let router = Self::build_router(state);
        Ok(Self {
            router,
            config,
            forwarder,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(set_request_id_layer())
    }

    /// The router, for serving it on a custom transport.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.forwarder.upstream(),
            prerender_token = if self.forwarder.prerender().has_token() { "yes" } else { "no" },
            "Proxy server running"
        );
        tracing::info!(
            health = %format!("http://localhost:{}/health", addr.port()),
            prerender_test = %format!("http://localhost:{}/prerender-test", addr.port()),
            "Test endpoints"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main handler: classify once, then serve locally or relay.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().clone();
    let url = path_and_query(request.uri()).to_string();
    let decision = classify(&request);

    tracing::info!(
        request_id = %request_id,
        method = %method,
        url = %url,
        decision = %decision,
        "Request received"
    );

    let (target, result) = match decision {
        RouteDecision::InternalPage(page) => {
            let response = internal::serve(page, state.health, request.headers());
            metrics::record_request(decision.as_str(), response.status().as_u16(), "local", start);
            return response;
        }
        RouteDecision::StaticBypass | RouteDecision::ApiBypass => (
            RelayTarget::Origin,
            state.forwarder.relay_transparent(request, client_addr).await,
        ),
        RouteDecision::PageCandidate => {
            let verdict = detect_bot(&request);
            if verdict.is_bot() {
                tracing::info!(
                    request_id = %request_id,
                    signal = verdict.label(),
                    "Bot detected, prerendering"
                );
                if state.serve_verification_page
                    && method == Method::GET
                    && request.uri().path() == "/"
                    && verdict.is_verification_probe()
                {
                    tracing::info!(request_id = %request_id, "Serving verification page");
                    metrics::record_request(decision.as_str(), 200, "local", start);
                    return internal::verification_page();
                }
                (
                    RelayTarget::Prerender,
                    state.forwarder.relay_prerender(request, client_addr).await,
                )
            } else {
                (
                    RelayTarget::Origin,
                    state.forwarder.relay_page(request, client_addr).await,
                )
            }
        }
    };

    let latency_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(response) => {
            tracing::info!(
                request_id = %request_id,
                target = target.as_str(),
                status = response.status().as_u16(),
                latency_ms,
                "Backend responded"
            );
            metrics::record_request(
                decision.as_str(),
                response.status().as_u16(),
                target.as_str(),
                start,
            );
            response
        }
        Err(error) => {
            tracing::error!(
                request_id = %request_id,
                target = target.as_str(),
                url = %url,
                error = %error,
                latency_ms,
                "Backend call failed"
            );
            metrics::record_request(
                decision.as_str(),
                error.status().as_u16(),
                target.as_str(),
                start,
            );
            error.with_url(url).into_response()
        }
    }
}

/// Turn a handler panic into a 500 for that request only.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    ProxyError::Internal("unexpected fault while handling the request".to_string())
        .with_url("")
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn unreachable_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        // Port 9 (discard) on loopback: nothing listens there in test environments.
        config.upstream.url = "http://127.0.0.1:9".into();
        config.prerender.service_url = "http://127.0.0.1:9/".into();
        config.timeouts.request_secs = 2;
        config
    }

    fn app(config: ProxyConfig) -> Router {
        let addr: SocketAddr = "198.51.100.7:40000".parse().unwrap();
        HttpServer::new(config)
            .unwrap()
            .router()
            .layer(MockConnectInfo(addr))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_never_touches_upstream() {
        let response = app(unreachable_config())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = json_body(response).await;
        assert_eq!(body["status"], "OK");
        assert_eq!(body["env"]["hasToken"], false);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let response = app(unreachable_config())
            .oneshot(Request::get("/tabs?id=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["url"], "/tabs?id=1");
        assert!(body["message"].as_str().is_some());
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_prerender_failure_does_not_leak_token() {
        let mut config = unreachable_config();
        config.prerender.token = Some("top-secret-token".into());
        let response = app(config)
            .oneshot(
                Request::get("/tabs")
                    .header("User-Agent", "Googlebot/2.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("top-secret-token"));
    }

    #[tokio::test]
    async fn test_verification_page_when_enabled() {
        let mut config = unreachable_config();
        config.prerender.serve_verification_page = true;
        let response = app(config)
            .oneshot(
                Request::get("/?_escaped_fragment_=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Prerender integration active"));
    }

    #[tokio::test]
    async fn test_panic_response_is_internal_error() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Internal Server Error");
    }
}
