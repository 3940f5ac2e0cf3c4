//! Header manipulation for relayed traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Replace `Host` with the target's authority
//! - Add X-Forwarded-For, X-Real-Ip, X-Forwarded-Proto, X-Forwarded-Host
//!
//! # Design Decisions
//! - Client-supplied X-Forwarded-For / X-Real-Ip are overwritten, never appended
//! - X-Forwarded-Proto is kept when the hosting TLS terminator set it
//! - Headers listed in `Connection` are treated as hop-by-hop too

use std::net::IpAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub static X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub static X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
pub static KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// Headers that only apply to a single transport leg.
pub static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    HeaderName::from_static("keep-alive"),
];

/// Remove hop-by-hop headers, including those nominated by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let nominated: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in nominated.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Per-request values used to build the forwarding headers.
#[derive(Debug, Clone)]
pub struct ForwardedFor<'a> {
    /// Peer address of the inbound connection.
    pub client_ip: IpAddr,
    /// `Host` the client addressed, if any.
    pub original_host: Option<&'a HeaderValue>,
}

/// Rewrite inbound headers for an outbound leg to `target_authority`.
pub fn prepare_outbound(headers: &mut HeaderMap, target_authority: &str, forwarded: &ForwardedFor<'_>) {
    let proto = headers
        .get(&X_FORWARDED_PROTO)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("http"));
    let original_host = forwarded.original_host.cloned();

    strip_hop_by_hop(headers);

    if let Ok(host) = HeaderValue::from_str(target_authority) {
        headers.insert(header::HOST, host);
    } else {
        headers.remove(header::HOST);
    }

    match original_host {
        Some(host) => {
            headers.insert(X_FORWARDED_HOST.clone(), host);
        }
        None => {
            headers.remove(&X_FORWARDED_HOST);
        }
    }
    headers.insert(X_FORWARDED_PROTO.clone(), proto);

    // An IpAddr always renders as a valid header value.
    if let Ok(ip) = HeaderValue::from_str(&forwarded.client_ip.to_string()) {
        headers.insert(X_FORWARDED_FOR.clone(), ip.clone());
        headers.insert(X_REAL_IP.clone(), ip);
    }

    if !headers.contains_key(header::ACCEPT) {
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    }
}
