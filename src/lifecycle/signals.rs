//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate the first signal into a graceful drain
//! - Translate a second signal into a forced stop
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handler install failures are logged; the proxy still runs, it just
//!   cannot be stopped by that signal

use std::fmt;
use std::io;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{DrainReason, Shutdown};

/// A termination request from the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => write!(f, "SIGINT"),
            TerminationSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Source of termination signals, registered once and awaited repeatedly.
struct SignalListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl SignalListener {
    #[cfg(unix)]
    fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Next termination signal. Signals arriving between calls are kept.
    #[cfg(unix)]
    async fn recv(&mut self) -> io::Result<TerminationSignal> {
        tokio::select! {
            _ = self.interrupt.recv() => Ok(TerminationSignal::Interrupt),
            _ = self.terminate.recv() => Ok(TerminationSignal::Terminate),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> io::Result<TerminationSignal> {
        tokio::signal::ctrl_c().await?;
        Ok(TerminationSignal::Interrupt)
    }
}

/// Drive `shutdown` from OS signals until the task is aborted.
///
/// First signal: `Running → Draining`. Any later signal: forced stop.
pub fn spawn_signal_handler(shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut signals = match SignalListener::install() {
            Ok(signals) => signals,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return;
            }
        };

        loop {
            match signals.recv().await {
                Ok(signal) => {
                    tracing::info!(signal = %signal, "Termination signal received");
                    if !shutdown.trigger(DrainReason::Signal) {
                        shutdown.force();
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Signal handler failed");
                    return;
                }
            }
        }
    })
}
