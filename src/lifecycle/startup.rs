//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener (fail fast: a bind error is fatal)
//! - Start the idle watcher and the accept loop
//! - Drain once the accept loop stops
//!
//! # Design Decisions
//! - Binding is separate from running so callers can learn the bound
//!   address (port 0) and grab a shutdown handle first
//! - Signal handling is opt-in (`run_until_signal`) so tests can drive
//!   shutdown programmatically

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::lifecycle::shutdown::{DrainOutcome, Shutdown};
use crate::lifecycle::signals::spawn_signal_handler;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{Listener, ListenerError};
use crate::proxy::ProxyServer;

/// A bound, not yet running, proxy.
pub struct Proxy {
    settings: Arc<Settings>,
    listener: Listener,
    shutdown: Shutdown,
    connections: ConnectionTracker,
}

impl Proxy {
    /// Bind the configured listen address.
    pub async fn bind(settings: Settings) -> Result<Self, ListenerError> {
        let listener = Listener::bind(&settings.listen_addr).await?;
        Ok(Self {
            settings: Arc::new(settings),
            listener,
            shutdown: Shutdown::new(),
            connections: ConnectionTracker::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle for triggering or observing shutdown.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Handle onto the active connection set.
    pub fn connections(&self) -> ConnectionTracker {
        self.connections.clone()
    }

    /// Serve until shutdown is triggered (idle timeout or a handle), then drain.
    pub async fn run(self) -> DrainOutcome {
        let Proxy {
            settings,
            listener,
            shutdown,
            connections,
        } = self;

        let idle_watcher = {
            let shutdown = shutdown.clone();
            let idle_timeout = settings.idle_timeout;
            tokio::spawn(async move { shutdown.watch_idle(idle_timeout).await })
        };

        let drain_timeout = settings.drain_timeout;
        ProxyServer::new(settings, connections.clone(), shutdown.clone())
            .run(listener)
            .await;

        // The watcher returns by itself once draining starts.
        let _ = idle_watcher.await;

        shutdown.drain(&connections, drain_timeout).await
    }

    /// Like `run`, with SIGINT/SIGTERM wired to the shutdown coordinator.
    pub async fn run_until_signal(self) -> DrainOutcome {
        let signals = spawn_signal_handler(self.shutdown.clone());
        let outcome = self.run().await;
        signals.abort();
        outcome
    }
}
