//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Settings → Bind listener → Start idle watcher → Accept loop
//!
//! Shutdown (shutdown.rs):
//!     Signal / idle timeout → Stop accepting → Drain connections → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     Second SIGTERM/SIGINT → Stop waiting for relays
//! ```
//!
//! # Design Decisions
//! - Bind failure is the only fatal runtime error
//! - Ordered shutdown: stop accept, drain, stop
//! - Draining never cancels relays; an optional deadline bounds the wait

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{DrainOutcome, DrainReason, Phase, Shutdown};
pub use startup::Proxy;
