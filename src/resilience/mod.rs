//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to origin or prerender backend:
//!     → timeouts.rs (enforce the per-call deadline)
//!     → On expiry: call dropped, 504 produced if nothing was sent yet
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - At most one outbound call per inbound request: no retries

pub mod timeouts;
