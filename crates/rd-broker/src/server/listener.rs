//! Broker listener
//!
//! Accepts incoming connections and spawns a handler task for each client.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use crate::server::handler::handle_connection;
use crate::state::BrokerState;

/// Signaling server accepting client connections
pub struct BrokerServer {
    /// Shared broker state
    state: Arc<BrokerState>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
}

impl BrokerServer {
    /// Create a new broker server
    pub fn new(state: Arc<BrokerState>, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    /// Bind `bind_addr` and serve until cancelled
    pub async fn run(&self, bind_addr: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener until cancelled
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        tracing::info!("Broker listening on {}", local_addr);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Broker shutting down");
                    break;
                }

                result = listener.accept() => {
                    match result {
                        Ok((socket, peer_addr)) => {
                            self.spawn_handler(socket, peer_addr);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn spawn_handler(&self, socket: TcpStream, peer_addr: SocketAddr) {
        tracing::info!("New connection from {}", peer_addr);

        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            match handle_connection(socket, peer_addr, state, cancel).await {
                Ok(()) => {
                    tracing::info!("Connection from {} closed", peer_addr);
                }
                Err(e) => {
                    tracing::warn!("Connection from {} closed with error: {:#}", peer_addr, e);
                }
            }
        });
    }
}
