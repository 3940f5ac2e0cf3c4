//! Outbound HTTP client.
//!
//! One pooled client is built at startup and shared by every request. It
//! speaks plain HTTP and HTTPS (rustls with the platform's native roots), so
//! the origin and the prerender service may use either scheme.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use hyper_rustls::{ConfigBuilderExt, HttpsConnector};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::crypto::ring;
use rustls::{ClientConfig, RootCertStore};

use crate::config::TimeoutConfig;

/// Client used for origin and prerender calls.
pub type HttpClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Build the shared client.
///
/// Without platform root certificates the client still serves `http://`
/// targets; every `https://` call then fails its handshake and surfaces as 502.
pub fn create_http_client(timeouts: &TimeoutConfig) -> Result<HttpClient, rustls::Error> {
    let mut http_connector = HttpConnector::new();
    http_connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    http_connector.enforce_http(false);

    // ring only; the process-default provider is never consulted.
    let builder = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()?;
    let tls = match builder.clone().with_native_roots() {
        Ok(builder) => builder.with_no_client_auth(),
        Err(e) => {
            tracing::warn!(error = %e, "No native root certificates, HTTPS targets will fail");
            builder
                .with_root_certificates(RootCertStore::empty())
                .with_no_client_auth()
        }
    };

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    tracing::debug!(
        connect_timeout_secs = timeouts.connect_secs,
        "Outbound client ready"
    );

    Ok(Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(90))
        .build(https_connector))
}
