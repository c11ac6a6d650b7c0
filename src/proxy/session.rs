//! Per-connection proxy session.
//!
//! # Responsibilities
//! - Drive one client connection through sequential request cycles
//! - Parse request bytes while forwarding them verbatim upstream
//! - Relay the upstream response back until upstream EOF
//! - Apply the keep-alive decision between cycles
//!
//! # Design Decisions
//! - One upstream connection per request cycle, opened before the first
//!   client byte is read and dropped once the response has been relayed.
//!   Upstream EOF is the only response-framing signal the relay trusts.
//! - Each chunk is parsed before it is forwarded, so bytes that fail to
//!   parse never reach the upstream.
//! - A refused upstream connection is answered with a literal 502 and
//!   ends the session; any other I/O failure ends the session without a
//!   synthesized response, since a partial relay cannot be repaired.
//!
//! # Data Flow
//! ```text
//! client ──read──▶ RequestParser ──verbatim chunk──▶ upstream
//!   ▲                                                   │
//!   └──────────────── response bytes ◀──────────────────┘
//!                (until upstream EOF, then keep-alive check)
//! ```

use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::http::{should_close, ParseError, RequestParser};
use crate::net::ConnectionId;

/// Read buffer size for both directions.
const READ_BUFFER_SIZE: usize = 4096;

/// Response sent to the client when the upstream refuses the connection.
const BAD_GATEWAY_RESPONSE: &[u8] = b"HTTP/1.1 502 Bad Gateway\r\n\r\n";

/// Errors that end a proxy session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The client sent bytes that do not parse as an HTTP request.
    #[error("malformed request: {0}")]
    Parse(#[from] ParseError),

    /// The upstream refused the connection; the client was sent a 502.
    #[error("upstream refused connection: {0}")]
    UpstreamUnreachable(#[source] std::io::Error),

    /// Connecting to the upstream failed for a reason other than refusal.
    #[error("upstream connect failed: {0}")]
    UpstreamConnect(#[source] std::io::Error),

    /// Reading from or writing to the client failed.
    #[error("client I/O failed: {0}")]
    Client(#[source] std::io::Error),

    /// Reading from or writing to the upstream failed.
    #[error("upstream I/O failed: {0}")]
    Upstream(#[source] std::io::Error),
}

/// One client connection's relay loop.
///
/// Owns the client stream for its whole life and runs request cycles
/// sequentially until the client disconnects, the keep-alive decision
/// closes the connection, or an error ends the session.
pub struct ProxySession {
    id: ConnectionId,
    client: TcpStream,
    peer_addr: SocketAddr,
    upstream_addr: SocketAddr,
}

impl ProxySession {
    /// Build a session for an accepted client connection.
    pub fn new(
        client: TcpStream,
        peer_addr: SocketAddr,
        upstream_addr: SocketAddr,
        id: ConnectionId,
    ) -> Self {
        Self {
            id,
            client,
            peer_addr,
            upstream_addr,
        }
    }

    /// Run request cycles until the session ends.
    ///
    /// Returns `Ok(())` when the client disconnects or the keep-alive
    /// decision closes the connection; any error is terminal for the
    /// session.
    pub async fn run(mut self) -> Result<(), SessionError> {
        loop {
            let mut parser = RequestParser::new();

            // Open the upstream connection for this cycle up front, so
            // request bytes can be forwarded as they arrive.
            let mut upstream = match TcpStream::connect(self.upstream_addr).await {
                Ok(stream) => stream,
                Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                    tracing::debug!(
                        connection_id = %self.id,
                        upstream = %self.upstream_addr,
                        "Upstream refused connection, answering 502"
                    );
                    let _ = self.client.write_all(BAD_GATEWAY_RESPONSE).await;
                    return Err(SessionError::UpstreamUnreachable(e));
                }
                Err(e) => return Err(SessionError::UpstreamConnect(e)),
            };

            let mut buf = [0u8; READ_BUFFER_SIZE];

            // Request phase: parse and forward client chunks until the
            // request is complete.
            while !parser.is_done() {
                let n = self
                    .client
                    .read(&mut buf)
                    .await
                    .map_err(SessionError::Client)?;
                if n == 0 {
                    tracing::debug!(
                        connection_id = %self.id,
                        peer_addr = %self.peer_addr,
                        "Client disconnected"
                    );
                    return Ok(());
                }

                parser.parse(&buf[..n])?;
                upstream
                    .write_all(&buf[..n])
                    .await
                    .map_err(SessionError::Upstream)?;
            }

            // Response phase: relay upstream bytes until EOF.
            loop {
                let n = upstream
                    .read(&mut buf)
                    .await
                    .map_err(SessionError::Upstream)?;
                if n == 0 {
                    break;
                }
                self.client
                    .write_all(&buf[..n])
                    .await
                    .map_err(SessionError::Client)?;
            }
            drop(upstream);

            let request = parser.into_request();
            tracing::debug!(
                connection_id = %self.id,
                method = %request.method(),
                path = %request.path(),
                version = %request.version(),
                "Request cycle complete"
            );

            if should_close(&request) {
                tracing::debug!(
                    connection_id = %self.id,
                    "Closing connection as requested"
                );
                return Ok(());
            }
        }
    }
}
