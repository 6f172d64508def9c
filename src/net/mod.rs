//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → connection.rs (register in the active set)
//!     → relay.rs (dial backend, pump both directions, close both sockets)
//!     → connection.rs (deregister)
//! ```
//!
//! # Design Decisions
//! - Each connection tracked for graceful shutdown
//! - A relay owns both of its sockets; nothing else touches them
//! - Per-connection errors never escape the relay task

pub mod connection;
pub mod listener;
pub mod relay;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionInfo, ConnectionTracker};
pub use listener::{Listener, ListenerError};
pub use relay::{relay, Direction, RelayError, RelaySummary};
