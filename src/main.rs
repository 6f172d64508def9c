//! TCP forwarding proxy.
//!
//! Accepts client connections and relays raw bytes to one of a set of
//! backends, picked per connection.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 TCP PROXY                    │
//!                        │                                              │
//!     Client             │  ┌──────────┐   ┌───────────────┐            │
//!     ───────────────────┼─▶│ listener │──▶│ load_balancer │            │
//!                        │  └────┬─────┘   └───────┬───────┘            │
//!                        │       │                 ▼                    │
//!                        │       │         ┌───────────────┐            │
//!     ◀──────────────────┼───────┴────────▶│     relay     │◀───────────┼──── Backend
//!                        │                 │ (2 pump tasks)│            │
//!                        │                 └───────────────┘            │
//!                        │                                              │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │ lifecycle: signals → drain → stopped   │  │
//!                        │  │ config · observability · resilience    │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tcp_proxy::config::{load_config_or_default, validate_config, ConfigError};
use tcp_proxy::lifecycle::Proxy;
use tcp_proxy::observability::init_logging;

#[derive(Parser)]
#[command(name = "tcp-proxy")]
#[command(about = "Layer-4 TCP forwarding proxy", long_about = None)]
struct Cli {
    /// Config file (TOML, or JSON with a .json extension). Defaults are used if missing.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the configured listen address.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration from {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }

    let settings = match validate_config(&config).map_err(ConfigError::from) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("invalid configuration in {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("failed to initialize logging: {}", e);
    }

    tracing::info!("tcp-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    if !cli.config.exists() {
        tracing::info!(path = %cli.config.display(), "Config file not found, using defaults");
    }
    tracing::info!(
        listen_addr = %settings.listen_addr,
        backends = ?settings.backends.iter().map(|b| b.as_str()).collect::<Vec<_>>(),
        idle_timeout_secs = settings.idle_timeout.as_secs(),
        dial_timeout_secs = settings.dial_timeout.as_secs(),
        "Configuration loaded"
    );

    let proxy = match Proxy::bind(settings).await {
        Ok(proxy) => proxy,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start proxy");
            return ExitCode::FAILURE;
        }
    };

    let outcome = proxy.run_until_signal().await;
    tracing::info!(outcome = ?outcome, "Exiting");
    ExitCode::SUCCESS
}
