//! rd-core: Core abstractions and configuration for rdesk
//!
//! This crate provides shared types, traits, and configuration structures
//! used by the broker daemon and the client library.

pub mod config;
pub mod error;
pub mod time;
pub mod traits;
pub mod trust;
pub mod types;

pub use error::RdError;
pub use trust::{SameDomainPolicy, TrustPolicy};
pub use types::{Account, Identity};
