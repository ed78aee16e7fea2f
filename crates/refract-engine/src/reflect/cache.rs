//! Wrapper cache
//!
//! Wrapping the same host token twice must yield the same wrapper data, so
//! every wrapped entity is stored in a [`ConcurrentStore`] keyed by its
//! token. Stores never overwrite: when two callers race to build the same
//! entry the first insert wins and the loser's copy is discarded.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use refract_sdk::{MemberToken, TypeToken};

use super::members::MemberData;
use super::types::TypeData;

/// Thread-safe first-insert-wins map
pub struct ConcurrentStore<K, V> {
    entries: DashMap<K, V>,
}

impl<K: Eq + Hash, V: Clone> ConcurrentStore<K, V> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get an entry, or `None` if absent
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert `value` unless the key is present; returns the stored value
    pub fn get_or_insert(&self, key: K, value: V) -> V {
        self.entries.entry(key).or_insert(value).value().clone()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash, V: Clone> Default for ConcurrentStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to build wrapper data
    pub misses: u64,
    /// Cached types
    pub types: usize,
    /// Cached methods and constructors
    pub methods: usize,
    /// Cached fields
    pub fields: usize,
    /// Cached properties
    pub properties: usize,
}

/// Per-kind wrapper stores plus hit/miss counters.
///
/// A cache is an ordinary value: share one between reflectors with an
/// `Arc`, or give each its own.
pub struct ReflectionCache {
    pub(crate) types: ConcurrentStore<TypeToken, Arc<TypeData>>,
    pub(crate) methods: ConcurrentStore<MemberToken, Arc<MemberData>>,
    pub(crate) fields: ConcurrentStore<MemberToken, Arc<MemberData>>,
    pub(crate) properties: ConcurrentStore<MemberToken, Arc<MemberData>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ReflectionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            types: ConcurrentStore::new(),
            methods: ConcurrentStore::new(),
            fields: ConcurrentStore::new(),
            properties: ConcurrentStore::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counters and store sizes
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            types: self.types.len(),
            methods: self.methods.len(),
            fields: self.fields.len(),
            properties: self.properties.len(),
        }
    }

    /// Drop every cached wrapper and reset the counters.
    ///
    /// Wrappers already handed out stay valid; wrapping again afterwards
    /// produces new data that compares equal but is not the same instance.
    pub fn clear(&self) {
        self.types.clear();
        self.methods.clear();
        self.fields.clear();
        self.properties.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for ReflectionCache {
    fn default() -> Self {
        Self::new()
    }
}
