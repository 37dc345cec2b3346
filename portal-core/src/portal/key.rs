//! Identifiers for registries and their entries.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique key of one portal entry.
///
/// Keys come from a single process-wide counter, so they are never reused and
/// no two registries ever hand out the same key, even when `show` is called
/// many times within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(u64);

impl EntryKey {
    /// Generate a new unique entry key.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw key value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EntryKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "portal-entry-{}", self.0)
    }
}

/// Identity of one registry, used to scope ambient handle lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn keys_are_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| thread::spawn(|| (0..1000).map(|_| EntryKey::new()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for key in handle.join().unwrap() {
                assert!(seen.insert(key), "duplicate key {key}");
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn key_display_is_prefixed() {
        let key = EntryKey(12);
        assert_eq!(key.to_string(), "portal-entry-12");
    }

    #[test]
    fn key_serializes_as_bare_number() {
        let key = EntryKey(5);
        assert_eq!(serde_json::to_string(&key).unwrap(), "5");
        let back: EntryKey = serde_json::from_str("5").unwrap();
        assert_eq!(back, key);
    }
}
