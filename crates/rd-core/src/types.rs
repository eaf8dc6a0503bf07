//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the local part and the domain of an identity
pub const DOMAIN_SEPARATOR: char = '@';

/// Domain-qualified account handle, e.g. `user1@institution.com`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create a new identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw handle
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trust-scoping domain: the segment after the first separator, up to
    /// any further separator.
    ///
    /// Returns `None` when there is no separator or the domain is empty.
    pub fn domain(&self) -> Option<&str> {
        self.0
            .split(DOMAIN_SEPARATOR)
            .nth(1)
            .filter(|domain| !domain.is_empty())
    }

    /// Check whether the handle is exactly `local@domain` with both parts
    /// non-empty
    pub fn is_qualified(&self) -> bool {
        let mut parts = self.0.split(DOMAIN_SEPARATOR);
        matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        )
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A login account: identity plus credential secret
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Domain-qualified handle
    pub identifier: Identity,
    /// Credential secret
    pub secret: String,
}

impl Account {
    /// Create a new account
    pub fn new(identifier: impl Into<Identity>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

// Secrets stay out of logs
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Compare two secrets without short-circuiting on the first mismatch
pub fn constant_time_eq(provided: &str, expected: &str) -> bool {
    if provided.len() != expected.len() {
        return false;
    }

    let mut result = 0u8;
    for (a, b) in provided.bytes().zip(expected.bytes()) {
        result |= a ^ b;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_domain() {
        assert_eq!(
            Identity::new("user1@institution.com").domain(),
            Some("institution.com")
        );
        assert_eq!(Identity::new("nodomain").domain(), None);
        assert_eq!(Identity::new("trailing@").domain(), None);
    }

    #[test]
    fn test_identity_domain_stops_at_second_separator() {
        let id = Identity::new("a@b@c.com");
        assert_eq!(id.domain(), Some("b"));
        assert!(!id.is_qualified());
    }

    #[test]
    fn test_identity_qualified() {
        assert!(Identity::new("a@b.com").is_qualified());
        assert!(!Identity::new("@b.com").is_qualified());
        assert!(!Identity::new("a@").is_qualified());
        assert!(!Identity::new("").is_qualified());
        assert!(!Identity::new("a@b.com@").is_qualified());
    }

    #[test]
    fn test_identity_serde_transparent() {
        let id = Identity::new("a@b.com");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""a@b.com""#);
    }

    #[test]
    fn test_account_debug_redacts_secret() {
        let account = Account::new("a@b.com", "hunter2");
        let debug = format!("{:?}", account);
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("123456", "123456"));
        assert!(!constant_time_eq("123456", "123457"));
        assert!(!constant_time_eq("12345", "123456"));
        assert!(!constant_time_eq("", "1"));
    }
}
