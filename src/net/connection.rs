//! Active connection tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Register each proxied connection before its relay starts IO
//! - Deregister on relay completion, on every path (RAII guard)
//! - Let the shutdown coordinator wait for the set to become empty

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::load_balancer::backend::BackendAddress;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Metadata for one in-flight proxied connection.
///
/// The sockets themselves are owned by the relay task; this is what the
/// rest of the process gets to see.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub peer_addr: SocketAddr,
    pub backend: BackendAddress,
    pub started_at: Instant,
}

impl ConnectionInfo {
    pub fn age(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[derive(Debug)]
struct TrackerInner {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    /// Live count. Updates go through the watch lock, so insert/remove
    /// and the zero check never race.
    count: watch::Sender<usize>,
}

/// The set of in-flight connections, tracked for graceful shutdown.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

impl ConnectionTracker {
    /// Create a new, empty connection tracker.
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            inner: Arc::new(TrackerInner {
                connections: DashMap::new(),
                count,
            }),
        }
    }

    /// Record a new active connection. Returns a guard that deregisters on drop.
    pub fn track(&self, peer_addr: SocketAddr, backend: BackendAddress) -> ConnectionGuard {
        let info = ConnectionInfo {
            id: ConnectionId::new(),
            peer_addr,
            backend,
            started_at: Instant::now(),
        };
        self.inner.connections.insert(info.id, info.clone());
        self.inner.count.send_modify(|n| *n += 1);

        ConnectionGuard {
            inner: Arc::clone(&self.inner),
            info,
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> usize {
        *self.inner.count.borrow()
    }

    /// In-flight connections, oldest first.
    pub fn snapshot(&self) -> Vec<ConnectionInfo> {
        let mut connections: Vec<ConnectionInfo> = self
            .inner
            .connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        connections.sort_by_key(|c| c.id);
        connections
    }

    /// Wait until no connection is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.count.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot fail.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a connection's lifetime.
/// Removes it from the tracker when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    inner: Arc<TrackerInner>,
    info: ConnectionInfo,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.info.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.inner.connections.remove(&self.info.id);
        self.inner.count.send_modify(|n| *n = n.saturating_sub(1));
        tracing::trace!(connection_id = %self.info.id, "Connection deregistered");
    }
}
