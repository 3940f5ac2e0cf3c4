//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher emits, per request:
//!     → logging.rs (request received, route decision, backend outcome, latency)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through every event of a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
