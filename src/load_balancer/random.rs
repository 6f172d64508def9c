//! Uniform random load balancing strategy.

use rand::Rng;

use crate::load_balancer::{
    backend::{BackendAddress, BackendSet},
    LoadBalancer,
};

/// Random selector.
///
/// Draws from the thread-local generator, which is seeded from OS entropy
/// and never shared between threads, so concurrent relay setups need no
/// locking.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl RandomSelector {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for RandomSelector {
    fn choose<'a>(&self, backends: &'a BackendSet) -> &'a BackendAddress {
        let index = rand::thread_rng().gen_range(0..backends.len());
        backends.get_wrapping(index)
    }
}
