//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Connection accepted
//!     → Apply load balancing algorithm:
//!         - random.rs (uniform pick, default)
//!         - round_robin.rs (rotate through backends)
//!     → backend.rs (BackendAddress handed to the relay)
//! ```
//!
//! # Design Decisions
//! - One pick per connection, no feedback from relay outcomes
//! - Backend sets are non-empty by construction, so selection cannot fail
//! - Selectors are shared across concurrently spawned relays (Send + Sync)

pub mod backend;
pub mod random;
pub mod round_robin;

use std::sync::Arc;

use crate::config::Strategy;
use backend::{BackendAddress, BackendSet};

pub use random::RandomSelector;
pub use round_robin::RoundRobin;

/// Backend selection policy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick one backend out of `backends`. Always returns a member of the set.
    fn choose<'a>(&self, backends: &'a BackendSet) -> &'a BackendAddress;
}

/// Build the selector for a configured strategy.
pub fn from_strategy(strategy: Strategy) -> Arc<dyn LoadBalancer> {
    match strategy {
        Strategy::Random => Arc::new(RandomSelector::new()),
        Strategy::RoundRobin => Arc::new(RoundRobin::new()),
    }
}
