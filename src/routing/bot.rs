//! Crawler detection.
//!
//! # Design Decisions
//! - Substring match on `User-Agent`, case-sensitive, not token-based.
//!   "Robot" matches "bot" and that over-classification is accepted.
//! - The legacy `_escaped_fragment_` query key marks a crawler whatever its value
//! - Missing or non-UTF-8 `User-Agent` means "not a bot", never an error

use axum::http::{header, HeaderMap, Request};

/// User-agent substrings that identify a crawler, checked in order.
pub const BOT_SIGNALS: &[&str] = &["Prerender", "bot", "crawler", "spider"];

/// Query key of the AJAX crawling scheme.
pub const ESCAPED_FRAGMENT: &str = "_escaped_fragment_";

/// Which heuristic fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotSignal {
    /// `User-Agent` contained this substring.
    UserAgent(&'static str),
    /// Query string carried `_escaped_fragment_`.
    EscapedFragment,
}

/// Outcome of bot detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BotVerdict {
    pub signal: Option<BotSignal>,
}

impl BotVerdict {
    pub const HUMAN: BotVerdict = BotVerdict { signal: None };

    pub fn is_bot(&self) -> bool {
        self.signal.is_some()
    }

    /// The prerender provider's own checker, as opposed to a search engine.
    pub fn is_verification_probe(&self) -> bool {
        matches!(
            self.signal,
            Some(BotSignal::UserAgent("Prerender")) | Some(BotSignal::EscapedFragment)
        )
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self.signal {
            None => "none",
            Some(BotSignal::UserAgent(s)) => s,
            Some(BotSignal::EscapedFragment) => ESCAPED_FRAGMENT,
        }
    }
}

/// Run bot detection on a request.
pub fn detect_bot<B>(req: &Request<B>) -> BotVerdict {
    detect(req.headers(), req.uri().query())
}

/// Run bot detection on headers and a raw query string.
pub fn detect(headers: &HeaderMap, query: Option<&str>) -> BotVerdict {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if let Some(signal) = BOT_SIGNALS.iter().find(|s| user_agent.contains(*s)) {
        return BotVerdict {
            signal: Some(BotSignal::UserAgent(*signal)),
        };
    }

    if query.is_some_and(has_escaped_fragment) {
        return BotVerdict {
            signal: Some(BotSignal::EscapedFragment),
        };
    }

    BotVerdict::HUMAN
}

fn has_escaped_fragment(query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == ESCAPED_FRAGMENT)
}
