//! Shutdown coordination for the proxy.
//!
//! Phases move one way only: `Running → Draining → Stopped`.
//!
//! - `Running → Draining`: termination signal, idle timeout, or an explicit
//!   request. The listener observes the transition and closes its socket.
//! - `Draining → Stopped`: every in-flight relay has finished, the drain
//!   deadline elapsed, or a second signal forced it.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::{watch, Notify};

use crate::net::connection::ConnectionTracker;

/// Coordinator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting connections, relays proceeding normally.
    Running,
    /// Listener closed; waiting for in-flight relays.
    Draining,
    /// Terminal.
    Stopped,
}

/// Why draining started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainReason {
    /// SIGINT / SIGTERM.
    Signal,
    /// No connection accepted within the idle timeout.
    IdleTimeout,
    /// Triggered programmatically.
    Requested,
}

impl fmt::Display for DrainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainReason::Signal => write!(f, "signal"),
            DrainReason::IdleTimeout => write!(f, "idle timeout"),
            DrainReason::Requested => write!(f, "requested"),
        }
    }
}

/// How draining ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every relay finished on its own.
    Drained,
    /// The drain deadline elapsed with relays still running.
    DeadlineExceeded { abandoned: usize },
    /// A forced shutdown cut draining short.
    Forced { abandoned: usize },
}

#[derive(Debug)]
struct ShutdownInner {
    phase: watch::Sender<Phase>,
    reason: OnceLock<DrainReason>,
    /// Poked by the listener on every accepted connection.
    activity: Notify,
    forced: Notify,
}

/// Coordinator for graceful shutdown.
///
/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

impl Shutdown {
    /// Create a new shutdown coordinator in the `Running` phase.
    pub fn new() -> Self {
        let (phase, _) = watch::channel(Phase::Running);
        Self {
            inner: Arc::new(ShutdownInner {
                phase,
                reason: OnceLock::new(),
                activity: Notify::new(),
                forced: Notify::new(),
            }),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.inner.phase.borrow()
    }

    /// Why draining started, once it has.
    pub fn reason(&self) -> Option<DrainReason> {
        self.inner.reason.get().copied()
    }

    /// Move from `Running` to `Draining`.
    ///
    /// Returns false if shutdown was already under way.
    pub fn trigger(&self, reason: DrainReason) -> bool {
        let transitioned = self.inner.phase.send_if_modified(|phase| {
            if *phase == Phase::Running {
                let _ = self.inner.reason.set(reason);
                *phase = Phase::Draining;
                true
            } else {
                false
            }
        });

        if transitioned {
            tracing::info!(reason = %reason, "Shutting down, draining connections");
        }
        transitioned
    }

    /// Stop waiting for in-flight relays.
    pub fn force(&self) {
        tracing::warn!("Forced shutdown requested");
        self.inner.forced.notify_one();
    }

    /// Reset the idle timer. Called for every accepted connection.
    pub fn record_activity(&self) {
        self.inner.activity.notify_one();
    }

    /// Resolves once the phase has left `Running`.
    pub async fn draining(&self) {
        let mut rx = self.inner.phase.subscribe();
        let _ = rx.wait_for(|phase| *phase != Phase::Running).await;
    }

    /// Resolves once the phase is `Stopped`.
    pub async fn stopped(&self) {
        let mut rx = self.inner.phase.subscribe();
        let _ = rx.wait_for(|phase| *phase == Phase::Stopped).await;
    }

    /// Trigger draining after `idle_timeout` without any recorded activity.
    ///
    /// Returns early if shutdown starts for another reason.
    pub async fn watch_idle(&self, idle_timeout: Duration) {
        loop {
            tokio::select! {
                biased;
                _ = self.draining() => return,
                _ = self.inner.activity.notified() => continue,
                _ = tokio::time::sleep(idle_timeout) => {
                    tracing::info!(
                        idle_timeout_secs = idle_timeout.as_secs(),
                        "No new connections within idle timeout"
                    );
                    self.trigger(DrainReason::IdleTimeout);
                    return;
                }
            }
        }
    }

    /// Wait for in-flight connections, then move to `Stopped`.
    ///
    /// Relays are never cancelled here; `deadline` and `force` only stop
    /// the waiting.
    pub async fn drain(
        &self,
        connections: &ConnectionTracker,
        deadline: Option<Duration>,
    ) -> DrainOutcome {
        let in_flight = connections.snapshot();
        tracing::info!(active_connections = in_flight.len(), "Draining");
        for conn in &in_flight {
            tracing::debug!(
                connection_id = %conn.id,
                peer_addr = %conn.peer_addr,
                backend = %conn.backend,
                age_ms = conn.age().as_millis() as u64,
                "Waiting for connection"
            );
        }

        let deadline = async {
            match deadline {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            _ = connections.wait_idle() => DrainOutcome::Drained,
            _ = deadline => DrainOutcome::DeadlineExceeded {
                abandoned: connections.active_count(),
            },
            _ = self.inner.forced.notified() => DrainOutcome::Forced {
                abandoned: connections.active_count(),
            },
        };

        match outcome {
            DrainOutcome::Drained => tracing::info!("All connections drained"),
            DrainOutcome::DeadlineExceeded { abandoned } => {
                tracing::warn!(abandoned, "Drain deadline exceeded")
            }
            DrainOutcome::Forced { abandoned } => tracing::warn!(abandoned, "Drain cut short"),
        }

        self.inner.phase.send_replace(Phase::Stopped);
        tracing::info!("Shutdown complete");
        outcome
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
