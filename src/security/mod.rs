//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request:
//!     → headers.rs (strip hop-by-hop, set Host, add X-Forwarded-*)
//!     → relay to origin / prerender backend
//! Inbound response:
//!     → headers.rs (strip hop-by-hop)
//! ```
//!
//! # Design Decisions
//! - Client-supplied X-Forwarded-For, X-Real-Ip and X-Forwarded-Host are
//!   overwritten; X-Forwarded-Proto is kept because the hosting TLS
//!   terminator sets it
//! - Secrets (prerender token) are injected by the forwarder, never echoed

pub mod headers;
