//! Prerender Reverse Proxy
//!
//! Sits in front of a single-page application. Crawlers get a fully
//! rendered page from the prerender service; everyone else gets the origin.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌───────────────────────────────────────────────┐
//!                              │                PRERENDER PROXY                │
//!     Client Request           │  ┌─────────┐    ┌────────────┐                │
//!     ─────────────────────────┼─▶│  http   │───▶│  routing   │                │
//!                              │  │ server  │    │ classifier │                │
//!                              │  └────┬────┘    │  + bot     │                │
//!                              │       │         └─────┬──────┘                │
//!                              │       ▼               ▼                       │
//!                              │  ┌─────────┐    ┌────────────┐                │
//!                              │  │internal │    │   proxy    │───────────────┼──▶ Origin
//!                              │  │  pages  │    │ forwarder  │───────────────┼──▶ Prerender
//!                              │  └─────────┘    └────────────┘                │
//!                              │                                               │
//!                              │  config · observability · resilience ·        │
//!                              │  security · lifecycle                         │
//!                              └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use prerender_proxy::config::{resolve_config, ConfigOverrides, LogFormat};
use prerender_proxy::http::HttpServer;
use prerender_proxy::lifecycle::Shutdown;
use prerender_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "prerender-proxy")]
#[command(about = "Reverse proxy that routes crawlers to a prerender service", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Origin base URL
    #[arg(long, env = "UPSTREAM_URL")]
    upstream_url: Option<String>,

    /// Prerender service token
    #[arg(long, env = "PRERENDER_TOKEN", hide_env_values = true)]
    prerender_token: Option<String>,

    /// Prerender service base URL
    #[arg(long, env = "PRERENDER_SERVICE_URL")]
    prerender_service_url: Option<String>,

    /// Log output format (pretty or json)
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        port: cli.port,
        upstream_url: cli.upstream_url,
        prerender_token: cli.prerender_token,
        prerender_service_url: cli.prerender_service_url,
        log_format: cli.log_format,
    };
    let config = resolve_config(cli.config.as_deref(), overrides)?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "prerender-proxy starting"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let server = HttpServer::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
