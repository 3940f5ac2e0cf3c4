//! Outbound forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher (http/server.rs)
//!     → relay.rs (Forwarder: pick target URI and hooks)
//!     → hooks.rs (Transparent | PageRewrite | PrerenderAuth)
//!     → client.rs (pooled hyper client, http + https)
//!     → origin or prerender service
//! ```
//!
//! # Design Decisions
//! - Targets are parsed once at startup (target.rs) and shared read-only
//! - One client and one connection pool for both backends

pub mod client;
pub mod hooks;
pub mod relay;
pub mod target;

pub use relay::{Forwarder, RelayTarget};
pub use target::{PrerenderTarget, TargetError, UpstreamTarget};
