//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tcp_proxy::config::{validate_config, ProxyConfig, Settings, Strategy};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

/// Start a backend that echoes every byte back until the peer closes.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        loop {
                            let n = match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => n,
                            };
                            if socket.write_all(&buf[..n]).await.is_err() {
                                return;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that writes `tag` to each connection and closes it.
#[allow(dead_code)]
pub async fn start_tagged_backend(tag: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = socket.write_all(tag.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address with nothing listening on it.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A backend that never completes a handshake: its accept queue is full and
/// it never accepts, so dials hang until the caller's timeout.
#[allow(dead_code)]
pub struct SilentBackend {
    pub addr: SocketAddr,
    _listener: TcpListener,
    _fillers: Vec<TcpStream>,
}

#[allow(dead_code)]
pub async fn start_silent_backend() -> SilentBackend {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut fillers = Vec::new();
    for _ in 0..16 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(stream) => fillers.push(stream.unwrap()),
            Err(_) => {
                return SilentBackend {
                    addr,
                    _listener: listener,
                    _fillers: fillers,
                }
            }
        }
    }
    panic!("accept queue never filled");
}

/// Validated settings listening on an ephemeral local port.
pub fn settings(backends: &[SocketAddr], strategy: Strategy) -> Settings {
    let config = ProxyConfig {
        listen_addr: "127.0.0.1:0".to_string(),
        backends: backends.iter().map(ToString::to_string).collect(),
        connection_timeout_secs: 60,
        dial_timeout_secs: 1,
        strategy,
        ..ProxyConfig::default()
    };
    validate_config(&config).unwrap()
}

/// Read until EOF, failing the test if the peer never closes.
#[allow(dead_code)]
pub async fn read_to_end(stream: &mut TcpStream) -> Vec<u8> {
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("connection should be closed by the proxy")
        .unwrap();
    out
}
