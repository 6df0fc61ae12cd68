//! Relay server accept loop.
//!
//! # Responsibilities
//! - Accept connections from the bounded listener
//! - Spawn one independent session task per connection
//! - Stop accepting on shutdown and report active sessions

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::config::RelayConfig;
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{ConnectionPermit, Listener};
use crate::session::{Session, SessionOptions};
use crate::upstream::Upstream;

/// Accepts client connections and relays each one to the upstream.
pub struct RelayServer<U> {
    upstream: Arc<U>,
    options: SessionOptions,
    tracker: ConnectionTracker,
}

impl<U> RelayServer<U>
where
    U: Upstream + 'static,
{
    /// Create a server from configuration and an upstream capability.
    pub fn new(config: &RelayConfig, upstream: U) -> Self {
        Self {
            upstream: Arc::new(upstream),
            options: SessionOptions::from_config(config),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Active-session tracker, used to drain on shutdown.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept connections until a shutdown signal is received.
    ///
    /// Accept errors are logged and do not stop the loop. Sessions already
    /// running are left to finish on their own.
    pub async fn run(&self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(address = %addr, "Relay server accepting connections"),
            Err(e) => tracing::warn!(error = %e, "Relay server started without local address"),
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => self.spawn_session(stream, peer_addr, permit),
                    Err(e) => tracing::error!(error = %e, "Error accepting connection"),
                },
                _ = shutdown.recv() => {
                    tracing::info!(
                        active_sessions = self.tracker.active_count(),
                        "Relay server received shutdown signal, no longer accepting"
                    );
                    break;
                }
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream, peer_addr: SocketAddr, permit: ConnectionPermit) {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(peer_addr = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
        }

        let guard = self.tracker.track();
        let connection_id = guard.id();
        let session = Session::new(
            connection_id,
            stream,
            Arc::clone(&self.upstream),
            self.options.clone(),
        );
        let span = tracing::info_span!("session", connection_id = %connection_id, peer_addr = %peer_addr);

        tokio::spawn(
            async move {
                tracing::debug!("Session started");
                let summary = session.run().await;
                tracing::debug!(
                    cycles = summary.cycles,
                    reason = summary.termination.reason(),
                    "Session finished"
                );
                drop(guard);
                drop(permit);
            }
            .instrument(span),
        );
    }
}
