//! Signaling messages for the rdesk broker
//!
//! Clients and the broker exchange JSON objects, one per line, tagged on the
//! `type` field. Every message has a kebab-case name and camelCase fields.
//!
//! # Message Flow
//!
//! Typical sequence for a call from A to B:
//!
//! 1. Both clients send `login` and receive `login-success`
//! 2. B sends `generate-access-key`, reads the key out to A (cross-domain only)
//! 3. A sends `offer` with B as target (and the key, if cross-domain)
//! 4. The broker authorizes the offer and forwards it to B as `offer`
//! 5. B replies with `answer`; both sides trickle `ice-candidate`s
//! 6. Either side ends the call with `disconnect-peer`, which the broker
//!    forwards as `peer-disconnected`
//!
//! Relayed messages carry the identity of the sender (`sourceIdentity`), never
//! the target, so the receiver always knows its counterpart.

use serde::{Deserialize, Serialize};

/// Kind of a session description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description produced by the peer transport.
///
/// Opaque to the broker; relayed unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Whether this is an offer or an answer
    #[serde(rename = "type")]
    pub kind: SdpType,
    /// SDP body
    pub sdp: String,
}

impl SessionDescription {
    /// Create an offer description
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    /// Create an answer description
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// A trickled connectivity candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// Candidate line
    pub candidate: String,
    /// Media stream identification tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    /// Index of the media description the candidate belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

impl IceCandidate {
    /// Create a candidate without media association
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
        }
    }
}

/// Messages sent from a client to the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Authenticate this connection
    Login { identifier: String, secret: String },

    /// Ask the broker for a fresh access key for the logged-in identity
    GenerateAccessKey,

    /// Start a session with `target_identity`
    Offer {
        target_identity: String,
        session_description: SessionDescription,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_key: Option<String>,
    },

    /// Accept a session offered by `target_identity`
    Answer {
        target_identity: String,
        session_description: SessionDescription,
    },

    /// Trickle a candidate to `target_identity`
    IceCandidate {
        target_identity: String,
        candidate: IceCandidate,
    },

    /// Tell `target_identity` that the call is over
    DisconnectPeer { target_identity: String },
}

impl ClientMessage {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Login { .. } => "login",
            ClientMessage::GenerateAccessKey => "generate-access-key",
            ClientMessage::Offer { .. } => "offer",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::IceCandidate { .. } => "ice-candidate",
            ClientMessage::DisconnectPeer { .. } => "disconnect-peer",
        }
    }

    /// Target identity for relayed messages
    pub fn target(&self) -> Option<&str> {
        match self {
            ClientMessage::Offer {
                target_identity, ..
            }
            | ClientMessage::Answer {
                target_identity, ..
            }
            | ClientMessage::IceCandidate {
                target_identity, ..
            }
            | ClientMessage::DisconnectPeer { target_identity } => Some(target_identity),
            ClientMessage::Login { .. } | ClientMessage::GenerateAccessKey => None,
        }
    }
}

/// Messages sent from the broker to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Login accepted
    LoginSuccess { identifier: String },

    /// Login rejected. Deliberately carries no reason.
    LoginFail,

    /// A fresh single-use access key
    AccessKeyGenerated { key: String },

    /// Relayed offer
    Offer {
        source_identity: String,
        session_description: SessionDescription,
    },

    /// Relayed answer
    Answer {
        source_identity: String,
        session_description: SessionDescription,
    },

    /// Relayed candidate
    IceCandidate {
        source_identity: String,
        candidate: IceCandidate,
    },

    /// The counterpart hung up
    PeerDisconnected { source_identity: String },

    /// Cross-domain offer sent without an access key
    CrossDomainRequiresKey,

    /// Cross-domain offer sent with a key that did not match
    InvalidKey,
}

impl ServerMessage {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::LoginSuccess { .. } => "login-success",
            ServerMessage::LoginFail => "login-fail",
            ServerMessage::AccessKeyGenerated { .. } => "access-key-generated",
            ServerMessage::Offer { .. } => "offer",
            ServerMessage::Answer { .. } => "answer",
            ServerMessage::IceCandidate { .. } => "ice-candidate",
            ServerMessage::PeerDisconnected { .. } => "peer-disconnected",
            ServerMessage::CrossDomainRequiresKey => "cross-domain-requires-key",
            ServerMessage::InvalidKey => "invalid-key",
        }
    }
}
