//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!       (connection_id, peer_addr, backend, bytes, reason)
//!     → logging.rs (subscriber setup, stdout)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Connection ID flows through every relay log line via a span
//! - Log level configurable via config, CLI and RUST_LOG

pub mod logging;

pub use logging::init_logging;
