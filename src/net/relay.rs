//! Bidirectional byte relay between a client and one backend.
//!
//! # Responsibilities
//! - Dial the chosen backend with a timeout
//! - Pump bytes client → backend and backend → client in two tasks
//! - Tear down the whole connection as soon as either direction ends
//! - Join both tasks before reporting, so both sockets are closed on return

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinError;

use crate::load_balancer::backend::BackendAddress;
use crate::resilience::timeouts::{dial, DialError};

const BUFFER_SIZE: usize = 16 * 1024;

/// Copy direction within a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

impl Direction {
    fn reverse(self) -> Self {
        match self {
            Direction::ClientToBackend => Direction::BackendToClient,
            Direction::BackendToClient => Direction::ClientToBackend,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToBackend => write!(f, "client->backend"),
            Direction::BackendToClient => write!(f, "backend->client"),
        }
    }
}

/// Per-connection relay failure. Never fatal to the listener.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("backend {backend} unreachable: {source}")]
    BackendUnreachable {
        backend: BackendAddress,
        #[source]
        source: DialError,
    },

    #[error("relay {direction} failed: {source}")]
    Io {
        direction: Direction,
        #[source]
        source: io::Error,
    },
}

/// Result of a completed relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelaySummary {
    pub client_to_backend: u64,
    pub backend_to_client: u64,
    pub duration: Duration,
}

impl RelaySummary {
    fn record(&mut self, direction: Direction, bytes: u64) {
        match direction {
            Direction::ClientToBackend => self.client_to_backend += bytes,
            Direction::BackendToClient => self.backend_to_client += bytes,
        }
    }
}

/// What one pump task reports when it stops.
#[derive(Debug)]
struct PumpOutcome {
    direction: Direction,
    bytes: u64,
    result: io::Result<()>,
}

impl PumpOutcome {
    fn from_join(joined: Result<PumpOutcome, JoinError>, direction: Direction) -> Self {
        joined.unwrap_or_else(|e| PumpOutcome {
            direction,
            bytes: 0,
            result: Err(io::Error::other(e)),
        })
    }
}

/// Relay `client` to `backend_addr` until either side closes or fails.
///
/// On a dial failure the client socket is closed before returning and no
/// byte has been forwarded. Otherwise both sockets are closed by the time
/// this returns, whichever direction finished first.
pub async fn relay(
    client: TcpStream,
    backend_addr: &BackendAddress,
    dial_timeout: Duration,
) -> Result<RelaySummary, RelayError> {
    let started = Instant::now();

    let backend = match dial(backend_addr, dial_timeout).await {
        Ok(stream) => stream,
        Err(source) => {
            drop(client);
            return Err(RelayError::BackendUnreachable {
                backend: backend_addr.clone(),
                source,
            });
        }
    };

    if let Err(e) = client.set_nodelay(true).and(backend.set_nodelay(true)) {
        tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
    }

    tracing::debug!(backend = %backend_addr, "Backend connected");

    let (client_read, client_write) = client.into_split();
    let (backend_read, backend_write) = backend.into_split();
    let (stop_tx, stop_rx) = watch::channel(false);

    let mut upstream = tokio::spawn(pump(
        client_read,
        backend_write,
        Direction::ClientToBackend,
        stop_rx.clone(),
    ));
    let mut downstream = tokio::spawn(pump(
        backend_read,
        client_write,
        Direction::BackendToClient,
        stop_rx,
    ));

    let (first, remaining) = tokio::select! {
        joined = &mut upstream => {
            (PumpOutcome::from_join(joined, Direction::ClientToBackend), downstream)
        }
        joined = &mut downstream => {
            (PumpOutcome::from_join(joined, Direction::BackendToClient), upstream)
        }
    };

    // One side is done: stop the other so both sockets get closed.
    let _ = stop_tx.send(true);
    let second = PumpOutcome::from_join(remaining.await, first.direction.reverse());

    let mut summary = RelaySummary::default();
    summary.record(first.direction, first.bytes);
    summary.record(second.direction, second.bytes);
    summary.duration = started.elapsed();

    if let Err(e) = &second.result {
        tracing::debug!(direction = %second.direction, error = %e, "Error while tearing down relay");
    }

    match first.result {
        Ok(()) => Ok(summary),
        Err(source) => Err(RelayError::Io {
            direction: first.direction,
            source,
        }),
    }
}

/// Copy from `reader` to `writer` until EOF, an error, or a stop request.
///
/// Dropping the halves on return is what closes the sockets.
async fn pump(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    direction: Direction,
    mut stop: watch::Receiver<bool>,
) -> PumpOutcome {
    let mut buf = vec![0u8; BUFFER_SIZE];
    let mut bytes = 0u64;

    let result = loop {
        let n = tokio::select! {
            biased;
            _ = stop.changed() => break Ok(()),
            read = reader.read(&mut buf) => match read {
                Ok(0) => break Ok(()),
                Ok(n) => n,
                Err(e) => break Err(e),
            },
        };

        tokio::select! {
            biased;
            _ = stop.changed() => break Ok(()),
            written = writer.write_all(&buf[..n]) => {
                if let Err(e) = written {
                    break Err(e);
                }
            }
        }
        bytes += n as u64;
    };

    // Pass EOF on to the destination; it may already be gone.
    let _ = writer.shutdown().await;

    PumpOutcome {
        direction,
        bytes,
        result,
    }
}
