pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::search::filter::CompiledQuery;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Default time-to-live of a cached upstream response
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Cache key: stable hash of an endpoint and its compiled query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(endpoint: &str, query: &CompiledQuery) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(endpoint.as_bytes());
        hasher.update(b"\n");
        hasher.update(query.canonical().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raw upstream payload and when it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<Value>,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > self.ttl
    }
}

/// TTL store of raw upstream responses.
///
/// Expiry is checked on read; there is no background sweep. When disabled,
/// every lookup misses and nothing is stored.
pub struct ResponseCache {
    entries: DashMap<Fingerprint, CacheEntry>,
    ttl: Duration,
    enabled: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(ttl_secs: u64, enabled: bool) -> Self {
        Self::with_clock(ttl_secs, enabled, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_secs: u64, enabled: bool, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: Duration::seconds(ttl_secs.min(u32::MAX as u64) as i64),
            enabled: AtomicBool::new(enabled),
            clock,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn get(&self, key: &Fingerprint) -> Option<CacheEntry> {
        if !self.is_enabled() {
            return None;
        }

        let now = self.clock.now();
        let entry = self.entries.get(key).map(|e| e.value().clone())?;
        if entry.is_expired(now) {
            debug!("Cache entry {} expired", key);
            self.entries
                .remove_if(key, |_, current| current.created_at == entry.created_at);
            return None;
        }
        Some(entry)
    }

    pub fn put(&self, key: Fingerprint, payload: Value) {
        if !self.is_enabled() {
            return;
        }

        let entry = CacheEntry {
            payload: Arc::new(payload),
            created_at: self.clock.now(),
            ttl: self.ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Drop every entry regardless of TTL, returning how many were removed
    pub fn clear_all(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        info!("Cleared {} cached responses", removed);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECS, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::filter::compile_query;
    use crate::search::types::SearchParams;
    use serde_json::json;

    fn key(n: u32) -> Fingerprint {
        let params = SearchParams {
            limit: n,
            ..SearchParams::default()
        };
        Fingerprint::of("Property", &compile_query(&params))
    }

    #[test]
    fn round_trip_then_expire() {
        let clock = Arc::new(ManualClock::default());
        let cache = ResponseCache::with_clock(60, true, clock.clone());

        cache.put(key(1), json!({ "value": [1] }));
        let hit = cache.get(&key(1)).expect("fresh entry");
        assert_eq!(*hit.payload, json!({ "value": [1] }));

        clock.advance(Duration::seconds(60));
        assert!(cache.get(&key(1)).is_some(), "exactly at ttl is still fresh");

        clock.advance(Duration::seconds(1));
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn put_overwrites() {
        let cache = ResponseCache::default();
        cache.put(key(1), json!(1));
        cache.put(key(1), json!(2));
        assert_eq!(*cache.get(&key(1)).unwrap().payload, json!(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn disabled_cache_is_pass_through() {
        let cache = ResponseCache::new(60, false);
        cache.put(key(1), json!(1));
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.len(), 0);

        cache.set_enabled(true);
        cache.put(key(1), json!(1));
        cache.set_enabled(false);
        assert!(cache.get(&key(1)).is_none());
    }

    #[test]
    fn clear_all_counts() {
        let cache = ResponseCache::default();
        cache.put(key(1), json!(1));
        cache.put(key(2), json!(2));
        assert_eq!(cache.clear_all(), 2);
        assert_eq!(cache.clear_all(), 0);
    }

    #[test]
    fn fingerprint_depends_on_endpoint_and_query() {
        let query = compile_query(&SearchParams::default());
        assert_eq!(Fingerprint::of("Property", &query), Fingerprint::of("Property", &query));
        assert_ne!(Fingerprint::of("Property", &query), Fingerprint::of("Member", &query));
        assert_ne!(key(1), key(2));
        assert_eq!(key(1).as_str().len(), 64);
    }
}
