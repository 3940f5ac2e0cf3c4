//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path, query, User-Agent)
//!     → classifier.rs (RouteDecision: internal / static / api / page)
//!     → bot.rs (BotVerdict, page candidates only)
//!     → dispatcher in http::server picks the forwarder mode
//! ```
//!
//! # Design Decisions
//! - Closed set of decisions, matched once in the dispatcher
//! - Deterministic: same input always yields the same decision
//! - First match wins; rule order is fixed in code, not configuration

pub mod bot;
pub mod classifier;

pub use bot::{detect_bot, BotSignal, BotVerdict};
pub use classifier::{classify, is_page_like, is_static_asset, InternalPage, RouteDecision};
