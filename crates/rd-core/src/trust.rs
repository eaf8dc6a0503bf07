//! Trust predicate used by the signaling relay
//!
//! The relay asks a [`TrustPolicy`] whether an offer between two identities
//! may pass without an access key. Untrusted pairs must present one.

use crate::types::Identity;

/// Decides whether `source` may open a session to `target` without a key
pub trait TrustPolicy: Send + Sync {
    /// Returns `true` if the pair is trusted
    fn is_trusted(&self, source: &Identity, target: &Identity) -> bool;
}

/// Trusts identities that share a domain.
///
/// Identities without a domain are never trusted, not even with each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameDomainPolicy;

impl TrustPolicy for SameDomainPolicy {
    fn is_trusted(&self, source: &Identity, target: &Identity) -> bool {
        match (source.domain(), target.domain()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
