//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, dispatcher)
//!     → request.rs (add or keep request ID)
//!     → [routing layer classifies path, detects crawlers]
//!     → internal.rs (local pages) or proxy::relay (origin / prerender)
//!     → response.rs (page header rewrite)
//!     → Send to client
//! ```

pub mod internal;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
