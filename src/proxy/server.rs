//! Relay server accept loop.
//!
//! # Responsibilities
//! - Bind the listener and resolve the upstream address
//! - Accept connections and spawn one session task per client
//! - Stop accepting on shutdown and drain in-flight sessions
//!
//! # Design Decisions
//! - One task per connection; each session runs its request cycles
//!   sequentially inside its task
//! - Accept errors are logged and the loop continues; a failed accept
//!   affects one connection, not the server
//! - Shutdown waits for sessions up to a grace period, then exits anyway

use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::RelayConfig;
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::proxy::session::{ProxySession, SessionError};

/// How long shutdown waits for in-flight sessions to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Error type for server setup.
#[derive(Debug)]
pub enum ServerError {
    /// The listener failed to bind.
    Listener(ListenerError),
    /// The configured upstream address does not parse.
    UpstreamAddress(std::net::AddrParseError),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::Listener(e) => write!(f, "Listener error: {}", e),
            ServerError::UpstreamAddress(e) => write!(f, "Invalid upstream address: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

/// The relay server: a bounded listener plus the upstream target.
pub struct RelayServer {
    listener: Listener,
    upstream_addr: SocketAddr,
    tracker: ConnectionTracker,
}

impl RelayServer {
    /// Bind the listener and prepare to relay to the configured upstream.
    pub async fn bind(config: &RelayConfig) -> Result<Self, ServerError> {
        let listener = Listener::bind(&config.listener)
            .await
            .map_err(ServerError::Listener)?;
        let upstream_addr = config
            .upstream
            .address
            .parse()
            .map_err(ServerError::UpstreamAddress)?;

        Ok(Self {
            listener,
            upstream_addr,
            tracker: ConnectionTracker::new(),
        })
    }

    /// Get the local address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept connections until the shutdown signal fires, then drain.
    ///
    /// Nothing in the loop is fatal: accept failures are logged and
    /// skipped, and session outcomes are logged by their own tasks.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            upstream = %self.upstream_addr,
            "Accepting connections"
        );

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr, permit)) => {
                            let guard = self.tracker.track();
                            let id = guard.id();
                            let session =
                                ProxySession::new(stream, peer_addr, self.upstream_addr, id);

                            tokio::spawn(async move {
                                // Hold the permit and guard for the whole session.
                                let _permit = permit;
                                let _guard = guard;

                                match session.run().await {
                                    Ok(()) => {
                                        tracing::debug!(connection_id = %id, "Session ended");
                                    }
                                    Err(e @ SessionError::Parse(_)) => {
                                        tracing::warn!(
                                            connection_id = %id,
                                            error = %e,
                                            "Session closed on malformed request"
                                        );
                                    }
                                    Err(
                                        e @ (SessionError::UpstreamUnreachable(_)
                                        | SessionError::UpstreamConnect(_)),
                                    ) => {
                                        tracing::warn!(
                                            connection_id = %id,
                                            error = %e,
                                            "Session closed on upstream failure"
                                        );
                                    }
                                    Err(e) => {
                                        tracing::debug!(
                                            connection_id = %id,
                                            error = %e,
                                            "Session closed on I/O error"
                                        );
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, draining sessions");
                    break;
                }
            }
        }

        if tokio::time::timeout(SHUTDOWN_GRACE, self.tracker.drained())
            .await
            .is_err()
        {
            tracing::warn!(
                active = self.tracker.active_count(),
                "Drain grace period expired, exiting with sessions active"
            );
        }

        tracing::info!("Relay server stopped");
    }
}
