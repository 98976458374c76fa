//! In-memory storage implementation

use super::entry::Entry;
use super::now_ms;
use super::value::Value;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

/// Type alias for our hash maps with SipHasher
type StoreMap = HashMap<String, Entry, BuildHasherDefault<SipHasher13>>;
type CacheMap = HashMap<String, CacheEntry, BuildHasherDefault<SipHasher13>>;

/// One cached outbound fetch: the retrieved payload plus an optional deadline.
///
/// Lives in its own namespace, fully independent from the key entries, but
/// follows the same expiry invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: String,
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => now_ms() > deadline,
            None => false,
        }
    }
}

/// In-memory key-value store
///
/// This is the core storage engine: a single-owner map of typed entries plus
/// the fetch cache. All mutation flows through one logical owner (the
/// dispatcher), so no internal locking is needed here.
pub struct MemoryStore {
    /// The main storage map
    entries: StoreMap,

    /// url -> cached fetch payload
    fetch_cache: CacheMap,
}

impl MemoryStore {
    /// Create a new memory store with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create a new memory store with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            entries: HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            ),
            fetch_cache: HashMap::default(),
        }
    }

    /// Set a key-value pair, replacing any prior value and clearing any expiry
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), Entry::new(value));
    }

    /// Get a value by key, returns None if not found or expired
    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.drop_if_expired(key);
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Get a mutable reference to a value by key
    ///
    /// Mutating in place keeps any expiry already set on the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.drop_if_expired(key);
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Delete a key, returns true if a live entry was removed
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    /// Check if a key exists (and is not expired)
    pub fn exists(&mut self, key: &str) -> bool {
        self.drop_if_expired(key);
        self.entries.contains_key(key)
    }

    /// Set an expiration on a key (TTL in seconds)
    ///
    /// Returns false without creating anything when the key does not exist.
    pub fn expire_in(&mut self, key: &str, ttl_seconds: u64) -> bool {
        self.drop_if_expired(key);
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.expire_in(ttl_seconds);
                true
            }
            None => false,
        }
    }

    /// Set an absolute expiration deadline (epoch milliseconds)
    ///
    /// Used by snapshot restore; like expire_in, never creates the key.
    pub fn set_expiry_at(&mut self, key: &str, deadline_ms: u64) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline_ms);
                true
            }
            None => false,
        }
    }

    /// Remaining TTL for a key in seconds
    ///
    /// Returns -1 when no expiry is set (or the key is absent), -2 when the
    /// deadline has already passed.
    pub fn ttl(&mut self, key: &str) -> i64 {
        match self.entries.get(key) {
            Some(entry) => entry.ttl_seconds().unwrap_or(-1),
            None => -1,
        }
    }

    /// Get all non-expired keys
    ///
    /// Order is unspecified but stable for a given store revision.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every key, every expiry and the whole fetch cache
    pub fn flush_all(&mut self) {
        self.entries.clear();
        self.fetch_cache.clear();
    }

    /// Cleanup expired keys and cache entries (proactive expiration)
    ///
    /// Returns the number of entries removed so the caller can persist once
    /// per sweep that changed state.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len() + self.fetch_cache.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        self.fetch_cache.retain(|_, cached| !cached.is_expired());
        before - (self.entries.len() + self.fetch_cache.len())
    }

    /// Look up a cached fetch payload, dropping it first when expired
    pub fn cache_get(&mut self, url: &str) -> Option<&CacheEntry> {
        let expired = self
            .fetch_cache
            .get(url)
            .map(|cached| cached.is_expired())
            .unwrap_or(false);
        if expired {
            self.fetch_cache.remove(url);
        }
        self.fetch_cache.get(url)
    }

    /// Store a fetched payload, with an optional TTL in seconds
    pub fn cache_put(&mut self, url: impl Into<String>, payload: String, ttl_seconds: Option<u64>) {
        let expires_at =
            ttl_seconds.map(|secs| now_ms().saturating_add(secs.saturating_mul(1000)));
        self.fetch_cache
            .insert(url.into(), CacheEntry { payload, expires_at });
    }

    /// Insert a cache entry with an already-absolute deadline (snapshot restore)
    pub fn cache_restore(&mut self, url: impl Into<String>, cached: CacheEntry) {
        self.fetch_cache.insert(url.into(), cached);
    }

    /// Iterate over live entries (key, value, expiry) for snapshotting
    pub fn iter_entries(&self) -> impl Iterator<Item = (&String, &Entry)> {
        self.entries.iter().filter(|(_, entry)| !entry.is_expired())
    }

    /// Iterate over live fetch-cache entries for snapshotting
    pub fn iter_cache(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.fetch_cache
            .iter()
            .filter(|(_, cached)| !cached.is_expired())
    }

    fn drop_if_expired(&mut self, key: &str) {
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.is_expired())
            .unwrap_or(false);
        if expired {
            self.entries.remove(key);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
