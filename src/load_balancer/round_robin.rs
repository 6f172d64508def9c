//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::{
    backend::{BackendAddress, BackendSet},
    LoadBalancer,
};

/// Round-robin selector.
/// Stores an internal counter to rotate through backends.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn choose<'a>(&self, backends: &'a BackendSet) -> &'a BackendAddress {
        let index = self.counter.fetch_add(1, Ordering::Relaxed);
        backends.get_wrapping(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new();
        let backends =
            BackendSet::new(vec!["127.0.0.1:8080".into(), "127.0.0.1:8081".into()]).unwrap();

        assert_eq!(lb.choose(&backends).as_str(), "127.0.0.1:8080");
        assert_eq!(lb.choose(&backends).as_str(), "127.0.0.1:8081");
        assert_eq!(lb.choose(&backends).as_str(), "127.0.0.1:8080");
    }
}
