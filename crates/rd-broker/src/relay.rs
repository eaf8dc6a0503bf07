//! Signaling relay
//!
//! Forwards offer, answer, candidate and hangup messages between two online
//! identities. Offers are authorized once; everything that follows in the
//! exchange is forwarded without re-checking.
//!
//! Messages for an identity that is not online are dropped without telling
//! the sender, so the relay never confirms who is connected.

use std::sync::Arc;

use rd_core::error::AuthorizationError;
use rd_core::trust::TrustPolicy;
use rd_core::types::Identity;
use rd_protocol::{IceCandidate, ServerMessage, SessionDescription};

use crate::auth::AccessKeyStore;
use crate::connection::{ConnectionHandle, Delivery};
use crate::presence::PresenceRegistry;

/// What happened to a relayed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Queued on the target's connection
    Delivered,
    /// Target has no presence entry
    TargetOffline,
    /// Target is online but its queue refused the message
    Undeliverable,
}

/// Routes signaling messages between online identities
pub struct SignalingRelay {
    presence: Arc<PresenceRegistry>,
    access_keys: Arc<AccessKeyStore>,
    policy: Arc<dyn TrustPolicy>,
}

impl SignalingRelay {
    /// Create a relay
    pub fn new(
        presence: Arc<PresenceRegistry>,
        access_keys: Arc<AccessKeyStore>,
        policy: Arc<dyn TrustPolicy>,
    ) -> Self {
        Self {
            presence,
            access_keys,
            policy,
        }
    }

    /// Authorize and forward an offer.
    ///
    /// Trusted pairs pass unconditionally; any supplied key is left alone.
    /// Untrusted pairs must present the target's current access key, which is
    /// consumed on success. An empty key counts as no key.
    ///
    /// The target's connection is resolved once, before authorization, and
    /// an authorized offer goes to that connection even if the target logs
    /// out meanwhile.
    pub fn offer(
        &self,
        source: &Identity,
        target: &Identity,
        session_description: SessionDescription,
        access_key: Option<&str>,
    ) -> Result<RelayOutcome, AuthorizationError> {
        let Some(handle) = self.presence.lookup(target) else {
            tracing::debug!("Offer from {} to offline {} dropped", source, target);
            return Ok(RelayOutcome::TargetOffline);
        };

        if self.policy.is_trusted(source, target) {
            tracing::info!("Offer {} -> {} relayed (trusted)", source, target);
        } else {
            let key = match access_key {
                Some(key) if !key.is_empty() => key,
                _ => {
                    tracing::warn!("Cross-domain offer {} -> {} without access key", source, target);
                    return Err(AuthorizationError::KeyRequired);
                }
            };

            if !self.access_keys.consume(target, key) {
                tracing::warn!("Cross-domain offer {} -> {} with invalid access key", source, target);
                return Err(AuthorizationError::InvalidKey);
            }

            tracing::info!("Offer {} -> {} relayed (access key consumed)", source, target);
        }

        Ok(deliver(
            &handle,
            ServerMessage::Offer {
                source_identity: source.to_string(),
                session_description,
            },
        ))
    }

    /// Forward an answer
    pub fn answer(
        &self,
        source: &Identity,
        target: &Identity,
        session_description: SessionDescription,
    ) -> RelayOutcome {
        self.forward(
            target,
            ServerMessage::Answer {
                source_identity: source.to_string(),
                session_description,
            },
        )
    }

    /// Forward a trickled candidate
    pub fn ice_candidate(
        &self,
        source: &Identity,
        target: &Identity,
        candidate: IceCandidate,
    ) -> RelayOutcome {
        self.forward(
            target,
            ServerMessage::IceCandidate {
                source_identity: source.to_string(),
                candidate,
            },
        )
    }

    /// Forward a hangup notice. Best effort.
    pub fn hangup(&self, source: &Identity, target: &Identity) -> RelayOutcome {
        let outcome = self.forward(
            target,
            ServerMessage::PeerDisconnected {
                source_identity: source.to_string(),
            },
        );
        tracing::info!("{} hung up on {} ({:?})", source, target, outcome);
        outcome
    }

    fn forward(&self, target: &Identity, message: ServerMessage) -> RelayOutcome {
        let Some(handle) = self.presence.lookup(target) else {
            tracing::debug!("{} for offline {} dropped", message.kind(), target);
            return RelayOutcome::TargetOffline;
        };

        deliver(&handle, message)
    }
}

fn deliver(handle: &ConnectionHandle, message: ServerMessage) -> RelayOutcome {
    match handle.deliver(message) {
        Delivery::Queued => RelayOutcome::Delivered,
        Delivery::Full | Delivery::Closed => RelayOutcome::Undeliverable,
    }
}

impl std::fmt::Debug for SignalingRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingRelay").finish_non_exhaustive()
    }
}

/// Message telling the offering client why its offer was refused
pub fn rejection_message(error: AuthorizationError) -> ServerMessage {
    match error {
        AuthorizationError::KeyRequired => ServerMessage::CrossDomainRequiresKey,
        AuthorizationError::InvalidKey => ServerMessage::InvalidKey,
    }
}
