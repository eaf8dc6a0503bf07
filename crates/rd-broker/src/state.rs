//! Shared broker state

use std::sync::Arc;

use rd_core::config::BrokerConfig;
use rd_core::error::ConfigError;
use rd_core::trust::{SameDomainPolicy, TrustPolicy};

use crate::auth::{AccessKeyStore, AuthGateway, CredentialTable};
use crate::presence::PresenceRegistry;
use crate::relay::SignalingRelay;

/// State shared by every connection task
pub struct BrokerState {
    /// Configuration
    pub config: BrokerConfig,
    /// Static account table
    pub credentials: Arc<CredentialTable>,
    /// Login handling
    pub gateway: Arc<AuthGateway>,
    /// Outstanding access keys
    pub access_keys: Arc<AccessKeyStore>,
    /// Online identities
    pub presence: Arc<PresenceRegistry>,
    /// Signaling relay
    pub relay: Arc<SignalingRelay>,
}

impl BrokerState {
    /// Create broker state with the same-domain trust policy
    pub fn new(config: BrokerConfig) -> Result<Self, ConfigError> {
        Self::with_policy(config, Arc::new(SameDomainPolicy))
    }

    /// Create broker state with a custom trust policy
    pub fn with_policy(
        config: BrokerConfig,
        policy: Arc<dyn TrustPolicy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let credentials = Arc::new(CredentialTable::from_accounts(&config.accounts));
        let presence = Arc::new(PresenceRegistry::new());
        let access_keys = Arc::new(AccessKeyStore::new());
        let gateway = Arc::new(AuthGateway::new(
            Arc::clone(&credentials),
            Arc::clone(&presence),
        ));
        let relay = Arc::new(SignalingRelay::new(
            Arc::clone(&presence),
            Arc::clone(&access_keys),
            policy,
        ));

        Ok(Self {
            config,
            credentials,
            gateway,
            access_keys,
            presence,
            relay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rd_core::types::Account;

    #[test]
    fn test_state_from_default_config() {
        let state = BrokerState::new(BrokerConfig::default()).unwrap();
        assert_eq!(state.credentials.len(), 3);
        assert!(state.presence.is_empty());
        assert!(state.access_keys.is_empty());
    }

    #[test]
    fn test_state_rejects_invalid_config() {
        let config = BrokerConfig {
            accounts: vec![Account::new("nodomain", "x")],
            ..Default::default()
        };
        assert!(BrokerState::new(config).is_err());
    }
}
