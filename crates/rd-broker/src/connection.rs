//! Connection handles
//!
//! A [`ConnectionHandle`] is the broker's way to push messages at a client.
//! It wraps the bounded outbound queue drained by that client's connection
//! task. Delivery never waits: a full or closed queue drops the message.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use rd_protocol::ServerMessage;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next identifier
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Result of a delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the connection task
    Queued,
    /// Outbound queue is full
    Full,
    /// Connection task is gone
    Closed,
}

/// Cloneable handle to one client connection
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer_addr: Option<SocketAddr>,
    tx: mpsc::Sender<ServerMessage>,
}

impl ConnectionHandle {
    /// Create a handle and the queue receiver its connection task drains
    pub fn channel(
        peer_addr: Option<SocketAddr>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = Self {
            id: ConnectionId::next(),
            peer_addr,
            tx,
        };
        (handle, rx)
    }

    /// Connection identifier
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote address, if known
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Queue a message without waiting
    pub fn deliver(&self, message: ServerMessage) -> Delivery {
        let kind = message.kind();
        match self.tx.try_send(message) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Outbound queue full on {}, dropping {}", self.id, kind);
                Delivery::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("{} already closed, dropping {}", self.id, kind);
                Delivery::Closed
            }
        }
    }

    /// Whether the connection task has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[tokio::test]
    async fn test_deliver_queues() {
        let (handle, mut rx) = ConnectionHandle::channel(None, 4);
        assert_eq!(handle.deliver(ServerMessage::InvalidKey), Delivery::Queued);
        assert_eq!(rx.recv().await, Some(ServerMessage::InvalidKey));
    }

    #[test]
    fn test_deliver_full_drops() {
        let (handle, _rx) = ConnectionHandle::channel(None, 1);
        assert_eq!(handle.deliver(ServerMessage::LoginFail), Delivery::Queued);
        assert_eq!(handle.deliver(ServerMessage::LoginFail), Delivery::Full);
    }

    #[test]
    fn test_deliver_closed() {
        let (handle, rx) = ConnectionHandle::channel(None, 1);
        drop(rx);
        assert!(handle.is_closed());
        assert_eq!(handle.deliver(ServerMessage::LoginFail), Delivery::Closed);
    }

    #[test]
    fn test_clone_shares_identity() {
        let (handle, _rx) = ConnectionHandle::channel(None, 1);
        let clone = handle.clone();
        assert_eq!(handle.id(), clone.id());
    }
}
