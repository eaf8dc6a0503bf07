//! Static credential table

use std::collections::HashMap;

use rd_core::types::{constant_time_eq, Account, Identity};

/// In-memory account table, immutable for the life of the process
#[derive(Default)]
pub struct CredentialTable {
    secrets: HashMap<Identity, String>,
}

impl CredentialTable {
    /// Build a table from configured accounts.
    ///
    /// A later duplicate replaces an earlier one; config validation rejects
    /// duplicates before this point.
    pub fn from_accounts(accounts: &[Account]) -> Self {
        let secrets = accounts
            .iter()
            .map(|a| (a.identifier.clone(), a.secret.clone()))
            .collect();
        Self { secrets }
    }

    /// Check an identifier/secret pair. Exact, case-sensitive match.
    pub fn verify(&self, identifier: &Identity, secret: &str) -> bool {
        match self.secrets.get(identifier) {
            Some(expected) => constant_time_eq(secret, expected),
            None => {
                // Same amount of work for unknown identifiers
                let _ = constant_time_eq(secret, secret);
                false
            }
        }
    }

    /// Whether an identity has an account
    pub fn contains(&self, identifier: &Identity) -> bool {
        self.secrets.contains_key(identifier)
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl std::fmt::Debug for CredentialTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialTable")
            .field("accounts", &self.secrets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CredentialTable {
        CredentialTable::from_accounts(&[
            Account::new("user1@institution.com", "pass1"),
            Account::new("user1@different.com", "pass3"),
        ])
    }

    #[test]
    fn test_verify() {
        let table = table();
        assert!(table.verify(&"user1@institution.com".into(), "pass1"));
        assert!(table.verify(&"user1@different.com".into(), "pass3"));
    }

    #[test]
    fn test_verify_wrong_secret() {
        let table = table();
        assert!(!table.verify(&"user1@institution.com".into(), "pass3"));
        assert!(!table.verify(&"user1@institution.com".into(), "PASS1"));
        assert!(!table.verify(&"user1@institution.com".into(), ""));
    }

    #[test]
    fn test_verify_unknown_identifier() {
        let table = table();
        assert!(!table.verify(&"ghost@institution.com".into(), "pass1"));
        assert!(!table.contains(&"ghost@institution.com".into()));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", table());
        assert!(!debug.contains("pass1"));
        assert!(debug.contains("2"));
    }
}
