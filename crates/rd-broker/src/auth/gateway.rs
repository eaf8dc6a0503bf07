//! Login handling

use std::sync::Arc;

use rd_core::error::AuthError;
use rd_core::types::Identity;

use super::CredentialTable;
use crate::connection::ConnectionHandle;
use crate::presence::PresenceRegistry;

/// Validates credentials and binds identities to connections
#[derive(Debug)]
pub struct AuthGateway {
    credentials: Arc<CredentialTable>,
    presence: Arc<PresenceRegistry>,
}

impl AuthGateway {
    /// Create a gateway over a credential table and presence registry
    pub fn new(credentials: Arc<CredentialTable>, presence: Arc<PresenceRegistry>) -> Self {
        Self {
            credentials,
            presence,
        }
    }

    /// Log `handle` in as `identifier`.
    ///
    /// On success the identity is registered in presence, replacing any
    /// earlier connection for it. The error never says which half of the
    /// credentials was wrong.
    pub fn login(
        &self,
        identifier: &str,
        secret: &str,
        handle: &ConnectionHandle,
    ) -> Result<Identity, AuthError> {
        let identity = Identity::new(identifier);

        if !self.credentials.verify(&identity, secret) {
            tracing::warn!("Login failed for '{}' on {}", identifier, handle.id());
            return Err(AuthError::InvalidCredentials);
        }

        self.presence.register(identity.clone(), handle.clone());
        tracing::info!("{} logged in on {}", identity, handle.id());

        Ok(identity)
    }
}
