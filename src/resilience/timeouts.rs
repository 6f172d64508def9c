//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend dials with a connect timeout
//! - Cancel the pending connect cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;

use crate::load_balancer::backend::BackendAddress;

/// Default backend dial timeout.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure to establish a backend connection.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("connect timed out after {0:?}")]
    TimedOut(Duration),

    #[error("connect failed: {0}")]
    Connect(#[from] io::Error),
}

/// Dial `addr`, giving up after `timeout`.
///
/// Hostnames are resolved as part of the dial, so slow DNS counts against
/// the same deadline.
pub async fn dial(addr: &BackendAddress, timeout: Duration) -> Result<TcpStream, DialError> {
    match tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(DialError::Connect(e)),
        Err(_) => Err(DialError::TimedOut(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpSocket};

    /// A listener whose accept queue is full, so new connects never complete.
    async fn saturated_listener() -> (TcpListener, Vec<TcpStream>) {
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut fillers = Vec::new();
        for _ in 0..16 {
            match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
                Ok(stream) => fillers.push(stream.unwrap()),
                Err(_) => return (listener, fillers),
            }
        }
        panic!("accept queue never filled");
    }

    #[tokio::test]
    async fn connects_to_listening_backend() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = BackendAddress::new(listener.local_addr().unwrap().to_string());

        let stream = dial(&addr, Duration::from_secs(1)).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap(), listener.local_addr().unwrap());
    }

    #[tokio::test]
    async fn refused_is_connect_error() {
        // Bind then drop to get a port with nothing listening.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            BackendAddress::new(listener.local_addr().unwrap().to_string())
        };

        let err = dial(&addr, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DialError::Connect(_)), "{err:?}");
    }

    #[tokio::test]
    async fn silent_backend_times_out() {
        let (listener, _fillers) = saturated_listener().await;
        let addr = BackendAddress::new(listener.local_addr().unwrap().to_string());

        let started = std::time::Instant::now();
        let err = dial(&addr, Duration::from_millis(300)).await.unwrap_err();
        assert!(
            matches!(err, DialError::TimedOut(t) if t == Duration::from_millis(300)),
            "{err:?}"
        );
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
