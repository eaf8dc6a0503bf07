//! Broker configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigError;
use crate::types::Account;

/// Configuration for the broker daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Address to accept client connections on
    pub bind_address: String,

    /// Capacity of each connection's outbound message queue
    pub outbound_queue: usize,

    /// Maximum accepted length of one signaling line, in bytes
    pub max_line_length: usize,

    /// Static credential table
    pub accounts: Vec<Account>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
            outbound_queue: 256,
            max_line_length: rd_protocol::MAX_LINE_LENGTH,
            accounts: default_accounts(),
        }
    }
}

/// Stand-in accounts used when no table is configured
fn default_accounts() -> Vec<Account> {
    vec![
        Account::new("user1@institution.com", "pass1"),
        Account::new("user2@institution.com", "pass2"),
        Account::new("user1@different.com", "pass3"),
    ]
}

impl BrokerConfig {
    /// Check the configuration for values the broker cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_queue == 0 {
            return Err(ConfigError::Invalid(
                "outbound_queue must be at least 1".to_string(),
            ));
        }

        if self.max_line_length == 0 {
            return Err(ConfigError::Invalid(
                "max_line_length must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for account in &self.accounts {
            if !account.identifier.is_qualified() {
                return Err(ConfigError::Invalid(format!(
                    "account '{}' is not of the form local@domain",
                    account.identifier
                )));
            }
            if !seen.insert(account.identifier.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate account '{}'",
                    account.identifier
                )));
            }
        }

        Ok(())
    }
}
