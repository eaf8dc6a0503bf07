//! rd-client: Client side of an rdesk session
//!
//! Talks to the broker, drives the local half of a call through its
//! lifecycle, and filters inbound remote-control commands before they reach
//! the machine being controlled.

pub mod access_key;
pub mod audit;
pub mod broker;
pub mod input;
pub mod session;

pub use audit::AuditLog;
pub use broker::BrokerClient;
pub use input::{Gatekeeper, InputPipeline, Verdict};
pub use session::{SessionLifecycle, SessionState};
