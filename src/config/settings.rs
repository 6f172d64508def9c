//! Validated runtime settings.

use std::time::Duration;

use crate::config::schema::Strategy;
use crate::load_balancer::backend::BackendSet;

/// Immutable settings shared (via `Arc`) by the listener loop, relays and
/// the shutdown coordinator. Built only by `validate_config`.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address to bind, "host:port".
    pub listen_addr: String,
    /// Non-empty backend set.
    pub backends: BackendSet,
    /// Shut down after this long without a new connection.
    pub idle_timeout: Duration,
    /// Maximum wait when dialing a backend.
    pub dial_timeout: Duration,
    /// Optional hard deadline on draining.
    pub drain_timeout: Option<Duration>,
    /// Backend selection strategy.
    pub strategy: Strategy,
}
