//! Core error types for rdesk
//!
//! Two failure classes are intentionally absent: an offline target and a
//! blocked input command are outcomes the sender never learns about, so they
//! are modelled as return values (`RelayOutcome`, `Verdict`) instead.

use rd_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the rdesk ecosystem
#[derive(Error, Debug)]
pub enum RdError {
    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Authorization error
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Login failures.
///
/// There is exactly one variant: an unknown identifier and a wrong secret
/// must be indistinguishable to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Credentials did not match
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Cross-domain authorization failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    /// Cross-domain offer without an access key
    #[error("Cross-domain connection requires an access key")]
    KeyRequired,

    /// Cross-domain offer with a key that does not match
    #[error("Access key is invalid")]
    InvalidKey,
}

/// Client-side session errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// A call is already in progress on this client
    #[error("A session is already in progress with {0}")]
    SessionInProgress(String),

    /// Target identity is empty or refers to ourselves
    #[error("Invalid call target: {0}")]
    InvalidTarget(String),

    /// Target is in another domain and no key was supplied
    #[error("Calling {0} requires an access key")]
    AccessKeyRequired(String),

    /// Signaling channel to the broker is gone
    #[error("Signaling channel closed")]
    SignalingClosed,

    /// The peer transport failed
    #[error("Transport failed: {0}")]
    Transport(#[from] TransportError),
}

/// Peer transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Session description could not be produced
    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    /// Remote description or candidate was rejected
    #[error("Remote data rejected: {0}")]
    Rejected(String),

    /// Local screen capture unavailable
    #[error("Capture unavailable: {0}")]
    Capture(String),

    /// Transport is closed
    #[error("Transport closed")]
    Closed,
}

/// Input execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The collaborator failed to inject the event
    #[error("Input injection failed: {0}")]
    InjectionFailed(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
