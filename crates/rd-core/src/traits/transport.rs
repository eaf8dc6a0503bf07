//! Peer transport traits

use async_trait::async_trait;
use rd_protocol::{IceCandidate, SessionDescription};

use crate::error::TransportError;

/// Connection state reported by a peer transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl TransportState {
    /// Whether this state ends the session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransportState::Disconnected | TransportState::Failed | TransportState::Closed
        )
    }
}

/// One peer-to-peer transport session (media plus input channel)
#[async_trait]
pub trait PeerLink: Send {
    /// Attach local screen capture to the session
    async fn attach_capture(&mut self) -> Result<(), TransportError>;

    /// Create the channel remote-input commands travel over
    async fn open_input_channel(&mut self) -> Result<(), TransportError>;

    /// Produce a local offer and apply it as the local description
    async fn create_offer(&mut self) -> Result<SessionDescription, TransportError>;

    /// Produce a local answer and apply it as the local description
    async fn create_answer(&mut self) -> Result<SessionDescription, TransportError>;

    /// Apply the counterpart's description
    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    /// Whether a remote description has been applied
    fn has_remote_description(&self) -> bool;

    /// Apply a trickled candidate from the counterpart
    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), TransportError>;

    /// Close the session and release capture. Must tolerate repeated calls.
    async fn close(&mut self);
}

/// Creates peer transport sessions
#[async_trait]
pub trait PeerLinkFactory: Send + Sync {
    /// The link type produced by this factory
    type Link: PeerLink;

    /// Create a fresh, unconnected link
    async fn create(&self) -> Result<Self::Link, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TransportState::Disconnected.is_terminal());
        assert!(TransportState::Failed.is_terminal());
        assert!(TransportState::Closed.is_terminal());
        assert!(!TransportState::Connecting.is_terminal());
        assert!(!TransportState::Connected.is_terminal());
        assert!(!TransportState::New.is_terminal());
    }
}
