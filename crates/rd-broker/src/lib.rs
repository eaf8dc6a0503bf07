//! rd-broker: Central signaling broker for rdesk
//!
//! The broker authenticates clients against a static credential table,
//! tracks which identities are online, issues single-use access keys, and
//! relays session negotiation messages between two online identities.
//! It never sees call content.

pub mod auth;
pub mod connection;
pub mod presence;
pub mod relay;
pub mod server;
pub mod state;

pub use relay::{RelayOutcome, SignalingRelay};
pub use server::BrokerServer;
pub use state::BrokerState;
