//! Layer-4 TCP forwarding proxy library.

pub mod config;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod resilience;

pub use config::{ProxyConfig, Settings};
pub use lifecycle::{Proxy, Shutdown};
