//! Authentication and authorization for the broker
//!
//! Logins are checked against a [`CredentialTable`]. Cross-domain offers are
//! authorized by single-use codes from the [`AccessKeyStore`].

mod access_keys;
mod credentials;
mod gateway;

pub use access_keys::{AccessKeyStore, KEY_RANGE};
pub use credentials::CredentialTable;
pub use gateway::AuthGateway;
