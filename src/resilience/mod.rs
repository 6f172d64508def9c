//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Relay needs a backend socket:
//!     → timeouts.rs (dial with a deadline)
//!     → On failure: connection dropped, listener keeps accepting
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend dial has a deadline
//! - No retries: a failed dial ends that one connection only
//! - Timeout errors are distinct from other connect errors

pub mod timeouts;
