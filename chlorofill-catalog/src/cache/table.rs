//! The cache table itself.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use super::freshness::CacheRead;

/// One hour, the lifetime of a cached catalog response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(3_600_000);

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry is served after it was fetched.
    pub entry_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entry_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.entry_ttl = ttl;
        self
    }
}

/// A decoded response and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// True while `now - fetched_at` is strictly below `ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age = (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO);
        age < ttl
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the table.
    pub hits: u64,
    /// Lookups that found nothing or only a stale entry.
    pub misses: u64,
    /// Entries currently held, stale ones included.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Unbounded key → response table with TTL-based freshness.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Fresh payload for `key`, if any.
    pub fn get(&self, key: &str) -> Option<CacheRead<Value>> {
        self.get_at(key, Utc::now())
    }

    /// Fresh payload for `key` as judged at `now`.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CacheRead<Value>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.config.entry_ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(CacheRead::from_cache(entry.payload.clone(), entry.fetched_at))
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `payload` under `key`, fetched now. Overwrites any prior entry.
    pub fn put(&self, key: &str, payload: Value) -> DateTime<Utc> {
        let fetched_at = Utc::now();
        self.put_at(key, payload, fetched_at);
        fetched_at
    }

    /// Store `payload` under `key` with an explicit fetch time.
    pub fn put_at(&self, key: &str, payload: Value, fetched_at: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                payload,
                fetched_at,
            },
        );
    }

    /// Raw entry for `key`, fresh or not.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_default_ttl_is_one_hour() {
        assert_eq!(CacheConfig::default().entry_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_get_on_empty_cache_misses() {
        let cache = ResponseCache::new(CacheConfig::default());
        assert!(cache.get("categories").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_put_then_get_hits() {
        let cache = ResponseCache::new(CacheConfig::default());
        let payload = json!({ "categories": [{ "strCategory": "Beef" }] });
        cache.put("categories", payload.clone());

        let read = cache.get("categories").expect("entry should be fresh");
        assert!(read.was_cache_hit());
        assert_eq!(read.into_value(), payload);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_entry_expires_at_exact_ttl() {
        let cache = ResponseCache::new(CacheConfig::default());
        let fetched_at = Utc::now();
        cache.put_at("areas", json!({}), fetched_at);

        let just_before = fetched_at + chrono::Duration::milliseconds(3_599_999);
        let at_ttl = fetched_at + chrono::Duration::milliseconds(3_600_000);
        assert!(cache.get_at("areas", just_before).is_some());
        assert!(cache.get_at("areas", at_ttl).is_none());
    }

    #[test]
    fn test_stale_entry_is_kept_until_overwritten() {
        let cache = ResponseCache::new(CacheConfig::default());
        let old = Utc::now() - chrono::Duration::hours(2);
        cache.put_at("areas", json!({ "v": 1 }), old);

        assert!(cache.get("areas").is_none());
        assert_eq!(cache.len(), 1);

        cache.put("areas", json!({ "v": 2 }));
        let entry = cache.entry("areas").expect("entry");
        assert_eq!(entry.payload, json!({ "v": 2 }));
        assert!(entry.fetched_at > old);
    }

    #[test]
    fn test_clear_empties_table() {
        let cache = ResponseCache::new(CacheConfig::default());
        cache.put("a", json!(1));
        cache.put("b", json!(2));
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            entry_count: 0,
        };
        assert!((stats.hit_rate() - 0.75).abs() < 0.001);
        assert!((CacheStats::default().hit_rate() - 0.0).abs() < 0.001);
    }

    proptest! {
        #[test]
        fn prop_fresh_iff_age_below_ttl(ttl_ms in 1u64..10_000_000, age_ms in 0i64..20_000_000) {
            let cache = ResponseCache::new(CacheConfig::new().with_ttl(Duration::from_millis(ttl_ms)));
            let fetched_at = Utc::now();
            cache.put_at("k", json!(null), fetched_at);
            let now = fetched_at + chrono::Duration::milliseconds(age_ms);
            prop_assert_eq!(cache.get_at("k", now).is_some(), (age_ms as u64) < ttl_ms);
        }

        #[test]
        fn prop_distinct_keys_do_not_collide(a in "[a-z_]{1,16}", b in "[a-z_]{1,16}") {
            prop_assume!(a != b);
            let cache = ResponseCache::new(CacheConfig::default());
            cache.put(&a, json!(a.clone()));
            cache.put(&b, json!(b.clone()));
            prop_assert_eq!(cache.get(&a).map(CacheRead::into_value), Some(json!(a)));
            prop_assert_eq!(cache.get(&b).map(CacheRead::into_value), Some(json!(b)));
        }
    }
}
