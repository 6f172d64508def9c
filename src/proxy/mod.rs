//! Proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Listener accept
//!     → load_balancer (pick backend)
//!     → net::connection (register)
//!     → spawn net::relay (dial + pump)
//!     → log outcome, deregister
//! ```
//!
//! # Design Decisions
//! - The accept loop never waits on a relay
//! - Backend choice is synchronous and happens before the relay task starts
//! - Relay errors are logged inside the task and go no further

pub mod server;

pub use server::ProxyServer;
