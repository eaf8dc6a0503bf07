//! Collaborator trait definitions
//!
//! The broker and client never talk to media or input APIs directly. The
//! peer transport and the input injector are supplied through these traits.

mod input;
mod transport;

pub use input::InputExecutor;
pub use transport::{PeerLink, PeerLinkFactory, TransportState};
