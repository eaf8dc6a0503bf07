//! Presence registry
//!
//! Maps each logged-in identity to the connection that last logged in as it.
//! A new login for an identity replaces the previous entry.

use dashmap::DashMap;

use rd_core::types::Identity;

use crate::connection::{ConnectionHandle, ConnectionId};

/// Registry of online identities
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: DashMap<Identity, ConnectionHandle>,
}

impl PresenceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identity` to `handle`, returning the entry it replaced
    pub fn register(&self, identity: Identity, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let new_id = handle.id();
        let previous = self.entries.insert(identity.clone(), handle);

        if let Some(prev) = &previous {
            if prev.id() != new_id {
                tracing::info!(
                    "{} logged in again on {}, replacing {}",
                    identity,
                    new_id,
                    prev.id()
                );
            }
        }

        previous
    }

    /// Remove the entry for `identity`. No-op if absent.
    pub fn unregister(&self, identity: &Identity) -> Option<ConnectionHandle> {
        self.entries.remove(identity).map(|(_, handle)| handle)
    }

    /// Remove the entry for `identity` only if it still belongs to `id`.
    ///
    /// Used on disconnect, so that a socket closing after its identity logged
    /// in elsewhere does not evict the newer connection.
    pub fn unregister_connection(&self, identity: &Identity, id: ConnectionId) -> bool {
        self.entries
            .remove_if(identity, |_, handle| handle.id() == id)
            .is_some()
    }

    /// Current connection for `identity`
    pub fn lookup(&self, identity: &Identity) -> Option<ConnectionHandle> {
        self.entries.get(identity).map(|r| r.value().clone())
    }

    /// Whether `identity` is currently bound to connection `id`
    pub fn is_bound_to(&self, identity: &Identity, id: ConnectionId) -> bool {
        self.entries
            .get(identity)
            .map_or(false, |r| r.value().id() == id)
    }

    /// Whether `identity` is online
    pub fn is_online(&self, identity: &Identity) -> bool {
        self.entries.contains_key(identity)
    }

    /// Snapshot of online identities
    pub fn identities(&self) -> Vec<Identity> {
        self.entries.iter().map(|r| r.key().clone()).collect()
    }

    /// Number of online identities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nobody is online
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new("alice@a.com")
    }

    #[test]
    fn test_is_bound_to_follows_latest_login() {
        let registry = PresenceRegistry::new();
        let (first, _rx1) = ConnectionHandle::channel(None, 1);
        let (second, _rx2) = ConnectionHandle::channel(None, 1);
        let (first_id, second_id) = (first.id(), second.id());

        registry.register(alice(), first);
        assert!(registry.is_bound_to(&alice(), first_id));

        registry.register(alice(), second);
        assert!(!registry.is_bound_to(&alice(), first_id));
        assert!(registry.is_bound_to(&alice(), second_id));
        assert!(!registry.is_bound_to(&Identity::new("bob@b.com"), second_id));
    }

    #[test]
    fn test_register_lookup() {
        let registry = PresenceRegistry::new();
        let (handle, _rx) = ConnectionHandle::channel(None, 1);
        let id = handle.id();

        assert!(registry.register(alice(), handle).is_none());
        assert_eq!(registry.lookup(&alice()).map(|h| h.id()), Some(id));
        assert!(registry.is_online(&alice()));
        assert_eq!(registry.identities(), vec![alice()]);
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = PresenceRegistry::new();
        let (first, _rx1) = ConnectionHandle::channel(None, 1);
        let (second, _rx2) = ConnectionHandle::channel(None, 1);
        let first_id = first.id();
        let second_id = second.id();

        registry.register(alice(), first);
        let replaced = registry.register(alice(), second);

        assert_eq!(replaced.map(|h| h.id()), Some(first_id));
        assert_eq!(registry.lookup(&alice()).map(|h| h.id()), Some(second_id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let registry = PresenceRegistry::new();
        assert!(registry.unregister(&alice()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_connection_ignores_stale_socket() {
        let registry = PresenceRegistry::new();
        let (old, _rx1) = ConnectionHandle::channel(None, 1);
        let (new, _rx2) = ConnectionHandle::channel(None, 1);
        let old_id = old.id();
        let new_id = new.id();

        registry.register(alice(), old);
        registry.register(alice(), new);

        assert!(!registry.unregister_connection(&alice(), old_id));
        assert!(registry.is_online(&alice()));

        assert!(registry.unregister_connection(&alice(), new_id));
        assert!(!registry.is_online(&alice()));
    }
}
