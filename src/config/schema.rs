//! Configuration schema definitions.
//!
//! This module defines the on-disk configuration structure for the proxy.
//! All types derive `Deserialize` for loading from config files.
//! Field aliases accept the camelCase keys used by older JSON configs.

use serde::Deserialize;

use crate::resilience::timeouts::DEFAULT_DIAL_TIMEOUT;

/// Root configuration for the TCP proxy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(alias = "listenAddr")]
    pub listen_addr: String,

    /// Backend addresses to forward to. Must not be empty.
    #[serde(alias = "server", alias = "servers")]
    pub backends: Vec<String>,

    /// Idle timeout in seconds: shut down when no connection has been
    /// accepted for this long.
    #[serde(alias = "connectionTimeout")]
    pub connection_timeout_secs: u64,

    /// Backend dial timeout in seconds.
    #[serde(alias = "dialTimeout")]
    pub dial_timeout_secs: u64,

    /// Hard deadline for draining in-flight connections on shutdown.
    /// `None` waits for every relay to finish.
    #[serde(alias = "drainTimeout")]
    pub drain_timeout_secs: Option<u64>,

    /// Backend selection strategy.
    pub strategy: Strategy,

    /// Log level (trace, debug, info, warn, error).
    #[serde(alias = "logLevel")]
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: "localhost:8080".to_string(),
            backends: vec![
                "localhost:5001".to_string(),
                "localhost:5002".to_string(),
                "localhost:5003".to_string(),
            ],
            connection_timeout_secs: 60,
            dial_timeout_secs: DEFAULT_DIAL_TIMEOUT.as_secs(),
            drain_timeout_secs: None,
            strategy: Strategy::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Backend selection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Uniformly random pick per connection.
    #[default]
    Random,
    /// Rotate through backends in configuration order.
    RoundRobin,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Random => write!(f, "random"),
            Strategy::RoundRobin => write!(f, "round_robin"),
        }
    }
}
