//! Single-use access keys
//!
//! A key belongs to the identity that generated it, i.e. the *target* of a
//! future cross-domain offer. Each identity has at most one outstanding key.
//! Keys never expire on the broker; they live until consumed or replaced.

use std::ops::Range;

use dashmap::DashMap;
use rand::Rng;

use rd_core::types::{constant_time_eq, Identity};

/// Keys are six-digit decimal numbers
pub const KEY_RANGE: Range<u32> = 100_000..1_000_000;

/// Store of outstanding access keys, one per identity
#[derive(Debug, Default)]
pub struct AccessKeyStore {
    keys: DashMap<Identity, String>,
}

impl AccessKeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh key for `identity`, replacing any unconsumed one
    pub fn generate(&self, identity: &Identity) -> String {
        let key = rand::thread_rng().gen_range(KEY_RANGE).to_string();
        if self.keys.insert(identity.clone(), key.clone()).is_some() {
            tracing::debug!("Replaced outstanding access key for {}", identity);
        }
        key
    }

    /// Redeem `supplied` against the key held for `identity`.
    ///
    /// Match and removal happen under one shard lock, so two concurrent
    /// offers cannot both succeed with the same key. A mismatch leaves the
    /// stored key untouched.
    pub fn consume(&self, identity: &Identity, supplied: &str) -> bool {
        self.keys
            .remove_if(identity, |_, stored| constant_time_eq(supplied, stored))
            .is_some()
    }

    /// Whether `identity` has an outstanding key
    pub fn has_key(&self, identity: &Identity) -> bool {
        self.keys.contains_key(identity)
    }

    /// Number of outstanding keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if no keys are outstanding
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn target() -> Identity {
        Identity::new("user2@institution.com")
    }

    #[test]
    fn test_generate_format() {
        let store = AccessKeyStore::new();
        for _ in 0..100 {
            let key = store.generate(&target());
            assert_eq!(key.len(), 6);
            let value: u32 = key.parse().unwrap();
            assert!(KEY_RANGE.contains(&value));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_consume_is_single_use() {
        let store = AccessKeyStore::new();
        let key = store.generate(&target());

        assert!(store.consume(&target(), &key));
        assert!(!store.consume(&target(), &key));
        assert!(!store.has_key(&target()));
    }

    #[test]
    fn test_regenerate_invalidates_previous() {
        let store = AccessKeyStore::new();
        let first = store.generate(&target());
        let mut second = store.generate(&target());
        while second == first {
            second = store.generate(&target());
        }

        assert!(!store.consume(&target(), &first));
        assert!(store.consume(&target(), &second));
    }

    #[test]
    fn test_wrong_key_has_no_side_effect() {
        let store = AccessKeyStore::new();
        let key = store.generate(&target());

        assert!(!store.consume(&target(), "000000"));
        assert!(!store.consume(&target(), ""));
        assert!(store.has_key(&target()));
        assert!(store.consume(&target(), &key));
    }

    #[test]
    fn test_key_scoped_to_owner() {
        let store = AccessKeyStore::new();
        let key = store.generate(&target());

        assert!(!store.consume(&Identity::new("user1@institution.com"), &key));
        assert!(store.consume(&target(), &key));
    }

    #[test]
    fn test_consume_without_key() {
        let store = AccessKeyStore::new();
        assert!(!store.consume(&target(), "123456"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_consume_single_winner() {
        let store = Arc::new(AccessKeyStore::new());
        let key = store.generate(&target());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let winners = Arc::clone(&winners);
                let key = key.clone();
                std::thread::spawn(move || {
                    if store.consume(&target(), &key) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
