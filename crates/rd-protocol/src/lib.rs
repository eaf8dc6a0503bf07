//! rd-protocol: Wire protocol for rdesk
//!
//! This crate defines the signaling messages exchanged between clients and
//! the broker, the remote-input commands sent over an established peer
//! transport, and the newline-delimited JSON codec used to frame both.

pub mod codec;
pub mod error;
pub mod input;
pub mod message;

pub use codec::{JsonLinesCodec, MAX_LINE_LENGTH};
pub use error::ProtocolError;
pub use input::{InputCommand, Modifier};
pub use message::{ClientMessage, IceCandidate, SdpType, ServerMessage, SessionDescription};
