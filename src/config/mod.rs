//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment / CLI overrides (PORT, UPSTREAM_URL, PRERENDER_TOKEN, ...)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → resolved into UpstreamTarget / PrerenderTarget at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, ConfigError, ConfigOverrides};
pub use schema::ProxyConfig;
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, PrerenderConfig, TimeoutConfig,
    UpstreamConfig,
};
