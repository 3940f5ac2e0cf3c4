//! Outbound call targets.
//!
//! Both targets are resolved once from the validated configuration and are
//! read-only afterwards; every request shares them through `Arc`.

use std::fmt;

use axum::http::header::HeaderValue;
use axum::http::Uri;
use url::Url;

use crate::config::{PrerenderConfig, UpstreamConfig};
use crate::error::ProxyError;

/// Error resolving a target from configuration.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("invalid URL '{0}': {1}")]
    Url(String, url::ParseError),
    #[error("URL '{0}' has no host")]
    MissingHost(String),
    #[error("URL '{0}' has an unsupported scheme")]
    Scheme(String),
    #[error("prerender token is not a valid header value")]
    Token,
    #[error("TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),
}

/// The single origin that human traffic is relayed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl UpstreamTarget {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, TargetError> {
        let url = parse_http_url(&config.url)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TargetError::MissingHost(config.url.clone()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| TargetError::Scheme(config.url.clone()))?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
        })
    }

    fn default_port(&self) -> u16 {
        if self.scheme == "https" {
            443
        } else {
            80
        }
    }

    /// `host` or `host:port` when the port is not the scheme default.
    pub fn authority(&self) -> String {
        if self.port == self.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Scheme and authority without a trailing slash.
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.authority())
    }

    /// Absolute URI for an inbound path and query, preserved verbatim.
    pub fn uri_for(&self, path_and_query: &str) -> Result<Uri, ProxyError> {
        format!("{}{}", self.origin(), path_and_query)
            .parse()
            .map_err(|e| ProxyError::Internal(format!("cannot build upstream URI: {}", e)))
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.origin())
    }
}

/// The prerender service plus its credentials.
#[derive(Clone)]
pub struct PrerenderTarget {
    service_url: String,
    authority: String,
    token: Option<HeaderValue>,
}

impl PrerenderTarget {
    pub fn from_config(config: &PrerenderConfig) -> Result<Self, TargetError> {
        let url = parse_http_url(&config.service_url)?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TargetError::MissingHost(config.service_url.clone()))?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let mut service_url = url.to_string();
        if !service_url.ends_with('/') {
            service_url.push('/');
        }

        let token = match config.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                let mut value = HeaderValue::from_str(token).map_err(|_| TargetError::Token)?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        Ok(Self {
            service_url,
            authority,
            token,
        })
    }

    /// `Host` value for calls to the service.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn token(&self) -> Option<&HeaderValue> {
        self.token.as_ref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Service URL followed by the absolute page URL on the origin.
    pub fn render_uri(&self, upstream: &UpstreamTarget, path_and_query: &str) -> Result<Uri, ProxyError> {
        format!("{}{}{}", self.service_url, upstream.origin(), path_and_query)
            .parse()
            .map_err(|e| ProxyError::Internal(format!("cannot build prerender URI: {}", e)))
    }
}

// The token must never reach a log line.
impl fmt::Debug for PrerenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrerenderTarget")
            .field("service_url", &self.service_url)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

fn parse_http_url(raw: &str) -> Result<Url, TargetError> {
    let url = Url::parse(raw).map_err(|e| TargetError::Url(raw.to_string(), e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(TargetError::Scheme(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(url: &str) -> UpstreamTarget {
        UpstreamTarget::from_config(&UpstreamConfig { url: url.into() }).unwrap()
    }

    #[test]
    fn test_upstream_default_port() {
        let target = upstream("https://riffcrusher.com");
        assert_eq!(target.scheme, "https");
        assert_eq!(target.host, "riffcrusher.com");
        assert_eq!(target.port, 443);
        assert_eq!(target.authority(), "riffcrusher.com");
        assert_eq!(target.to_string(), "https://riffcrusher.com");
    }

    #[test]
    fn test_upstream_explicit_port() {
        let target = upstream("http://127.0.0.1:8080/ignored/path");
        assert_eq!(target.port, 8080);
        assert_eq!(target.authority(), "127.0.0.1:8080");
        assert_eq!(
            target.uri_for("/tabs?id=1&x=%20").unwrap().to_string(),
            "http://127.0.0.1:8080/tabs?id=1&x=%20"
        );
    }

    #[test]
    fn test_upstream_rejects_other_schemes() {
        let err = UpstreamTarget::from_config(&UpstreamConfig {
            url: "ftp://example.com".into(),
        })
        .unwrap_err();
        assert!(matches!(err, TargetError::Scheme(_)));
    }

    #[test]
    fn test_render_uri() {
        let prerender = PrerenderTarget::from_config(&PrerenderConfig {
            service_url: "https://service.prerender.io".into(),
            token: Some("tok".into()),
            serve_verification_page: false,
        })
        .unwrap();
        let uri = prerender
            .render_uri(&upstream("https://riffcrusher.com"), "/tabs/1?a=b")
            .unwrap();
        assert_eq!(
            uri.to_string(),
            "https://service.prerender.io/https://riffcrusher.com/tabs/1?a=b"
        );
        assert_eq!(prerender.authority(), "service.prerender.io");
        assert!(prerender.token().unwrap().is_sensitive());
    }

    #[test]
    fn test_debug_hides_token() {
        let prerender = PrerenderTarget::from_config(&PrerenderConfig {
            token: Some("super-secret".into()),
            ..Default::default()
        })
        .unwrap();
        let rendered = format!("{:?}", prerender);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("has_token: true"));
    }

    #[test]
    fn test_missing_token() {
        let prerender = PrerenderTarget::from_config(&PrerenderConfig::default()).unwrap();
        assert!(!prerender.has_token());
    }
}
