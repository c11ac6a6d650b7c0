//! Shared utilities for relay integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use http_relay::config::RelayConfig;
use http_relay::lifecycle::Shutdown;
use http_relay::proxy::RelayServer;

/// Handle to a mock upstream server.
///
/// Records every accepted connection, every byte received, and every
/// complete request so tests can assert on exactly what the relay
/// forwarded, even when a connection dies before a request completes.
pub struct MockUpstream {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<u8>>>,
    requests: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockUpstream {
    /// Number of connections the relay has opened to this upstream.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Number of those connections that have ended, whether by EOF from
    /// the relay or after being answered.
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Wait until `n` of this upstream's connections have ended. Once a
    /// connection has ended, every byte it carried is in the byte log.
    ///
    /// Panics if that does not happen within two seconds.
    pub async fn wait_closed(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.closed_count() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("upstream connection should have ended in time");
    }

    /// Every byte received so far, complete request or not.
    pub fn received_bytes(&self) -> Vec<u8> {
        self.received.lock().unwrap().clone()
    }

    /// Snapshot of the complete requests received so far.
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock upstream that reads one request per connection and then
/// answers with a fixed response followed by EOF.
pub async fn start_mock_upstream(response: &'static [u8]) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));
    let requests = Arc::new(Mutex::new(Vec::new()));

    let conn_counter = connections.clone();
    let closed_counter = closed.clone();
    let byte_log = received.clone();
    let request_log = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    conn_counter.fetch_add(1, Ordering::SeqCst);
                    let closed_counter = closed_counter.clone();
                    let byte_log = byte_log.clone();
                    let request_log = request_log.clone();
                    tokio::spawn(async move {
                        if let Some(request) = read_one_request(&mut socket, &byte_log).await {
                            request_log.lock().unwrap().push(request);
                            let _ = socket.write_all(response).await;
                            let _ = socket.shutdown().await;
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                        closed_counter.fetch_add(1, Ordering::SeqCst);
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockUpstream {
        addr,
        connections,
        closed,
        received,
        requests,
    }
}

/// Read one full request: headers up to the blank line, plus any body
/// declared by Content-Length. Each chunk is appended to `byte_log` as
/// it arrives, so bytes that never amount to a complete request are
/// still visible to tests. Returns None if the connection closes first.
async fn read_one_request(socket: &mut TcpStream, byte_log: &Mutex<Vec<u8>>) -> Option<Vec<u8>> {
    let mut received = Vec::new();
    let mut buf = [0u8; 1024];

    loop {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        byte_log.lock().unwrap().extend_from_slice(&buf[..n]);
        received.extend_from_slice(&buf[..n]);

        if let Some(headers_end) = find_subsequence(&received, b"\r\n\r\n") {
            let body_length = declared_body_length(&received[..headers_end]);
            if received.len() >= headers_end + 4 + body_length {
                return Some(received);
            }
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn declared_body_length(headers: &[u8]) -> usize {
    let text = String::from_utf8_lossy(headers);
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("Content-Length:") {
            return value.trim().parse().unwrap_or(0);
        }
    }
    0
}

/// Start the relay on an ephemeral port, targeting the given upstream.
///
/// The listener is bound before this returns, so clients can connect
/// immediately. Returns the relay's address and its shutdown handle.
pub async fn start_relay(upstream: SocketAddr) -> (SocketAddr, Shutdown) {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.address = upstream.to_string();

    let server = RelayServer::bind(&config).await.expect("relay should bind");
    let addr = server.local_addr().expect("listener should have an address");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(shutdown_rx).await;
    });

    (addr, shutdown)
}

/// Reserve a port that nothing is listening on.
///
/// Binds an ephemeral port and immediately drops the listener; connecting
/// to the returned address is then refused.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
