//! Accept loop.
//!
//! # Responsibilities
//! - Accept connections until shutdown starts draining
//! - Pick a backend and register the connection for each accept
//! - Spawn one relay task per connection
//! - Keep accepting through per-connection and accept errors

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::Instrument;

use crate::config::Settings;
use crate::lifecycle::shutdown::Shutdown;
use crate::load_balancer::{self, LoadBalancer};
use crate::net::connection::ConnectionTracker;
use crate::net::listener::Listener;
use crate::net::relay::{relay, RelayError};

/// Pause after a failed accept so persistent errors (EMFILE) don't spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// TCP proxy server: owns the accept loop.
pub struct ProxyServer {
    settings: Arc<Settings>,
    balancer: Arc<dyn LoadBalancer>,
    connections: ConnectionTracker,
    shutdown: Shutdown,
}

impl ProxyServer {
    /// Create a server using the selector configured in `settings`.
    pub fn new(settings: Arc<Settings>, connections: ConnectionTracker, shutdown: Shutdown) -> Self {
        let balancer = load_balancer::from_strategy(settings.strategy);
        Self::with_balancer(settings, balancer, connections, shutdown)
    }

    pub fn with_balancer(
        settings: Arc<Settings>,
        balancer: Arc<dyn LoadBalancer>,
        connections: ConnectionTracker,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            settings,
            balancer,
            connections,
            shutdown,
        }
    }

    /// Run the accept loop until shutdown leaves `Running`.
    ///
    /// The listener is dropped (socket closed) before this returns.
    /// In-flight relays keep running.
    pub async fn run(self, listener: Listener) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(
                address = %addr,
                backends = self.settings.backends.len(),
                strategy = %self.settings.strategy,
                "Proxy accepting connections"
            ),
            Err(e) => tracing::warn!(error = %e, "Proxy accepting connections on unknown address"),
        }

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.draining() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        self.shutdown.record_activity();
                        self.dispatch(stream, peer_addr);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Accept error");
                        tokio::select! {
                            _ = self.shutdown.draining() => break,
                            _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                        }
                    }
                },
            }
        }

        drop(listener);
        tracing::info!(
            active_connections = self.connections.active_count(),
            "Listener closed, no longer accepting connections"
        );
    }

    /// Choose a backend, register the connection, and hand it to a relay task.
    fn dispatch(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let backend = self.balancer.choose(&self.settings.backends).clone();
        let guard = self.connections.track(peer_addr, backend.clone());
        let dial_timeout = self.settings.dial_timeout;

        tracing::info!(
            connection_id = %guard.id(),
            peer_addr = %peer_addr,
            backend = %backend,
            "Proxying connection"
        );

        let span = tracing::info_span!("connection", id = %guard.id(), peer = %peer_addr);
        tokio::spawn(
            async move {
                match relay(stream, &backend, dial_timeout).await {
                    Ok(summary) => tracing::info!(
                        backend = %backend,
                        bytes_to_backend = summary.client_to_backend,
                        bytes_from_backend = summary.backend_to_client,
                        duration_ms = summary.duration.as_millis() as u64,
                        "Connection closed"
                    ),
                    Err(e @ RelayError::BackendUnreachable { .. }) => {
                        tracing::warn!(backend = %backend, error = %e, "Backend unreachable, client closed")
                    }
                    Err(e) => tracing::warn!(backend = %backend, error = %e, "Relay failed"),
                }
                drop(guard);
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::shutdown::DrainReason;
    use crate::load_balancer::backend::{BackendAddress, BackendSet};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Always picks the last backend.
    #[derive(Debug)]
    struct LastBackend;

    impl LoadBalancer for LastBackend {
        fn choose<'a>(&self, backends: &'a BackendSet) -> &'a BackendAddress {
            backends.get_wrapping(backends.len() - 1)
        }
    }

    #[tokio::test]
    async fn custom_balancer_picks_backend() {
        let dead = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let live_addr = live.local_addr().unwrap();

        let settings = Arc::new(Settings {
            listen_addr: "127.0.0.1:0".to_string(),
            backends: BackendSet::new(vec![
                BackendAddress::new(dead.to_string()),
                BackendAddress::new(live_addr.to_string()),
            ])
            .unwrap(),
            idle_timeout: Duration::from_secs(60),
            dial_timeout: Duration::from_secs(1),
            drain_timeout: None,
            strategy: crate::config::Strategy::Random,
        });
        let listener = Listener::bind("127.0.0.1:0").await.unwrap();
        let proxy_addr = listener.local_addr().unwrap();
        let connections = ConnectionTracker::new();
        let shutdown = Shutdown::new();

        let server = ProxyServer::with_balancer(
            settings,
            Arc::new(LastBackend),
            connections.clone(),
            shutdown.clone(),
        );
        let run = tokio::spawn(server.run(listener));

        let mut client = TcpStream::connect(proxy_addr).await.unwrap();
        let (mut backend, _) = live.accept().await.unwrap();
        assert_eq!(connections.snapshot()[0].backend.as_str(), live_addr.to_string());

        client.write_all(b"hi").await.unwrap();
        let mut buf = [0u8; 2];
        backend.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");

        shutdown.trigger(DrainReason::Requested);
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("accept loop should stop")
            .unwrap();
    }
}
