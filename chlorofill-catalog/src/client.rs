//! Cache-backed fetch client shared by the catalog APIs.

use std::sync::Arc;

use chlorofill_core::CatalogError;
use serde_json::Value;

use crate::cache::{CacheConfig, CacheRead, CacheStats, ResponseCache};
use crate::transport::CatalogTransport;

/// Fetches catalog resources, consulting a [`ResponseCache`] first.
///
/// Two concurrent misses on the same key both go to the network and both
/// write the table; the later write wins. Catalog reads are idempotent, so
/// this only costs a duplicate request.
pub struct CachedFetchClient<T: CatalogTransport> {
    transport: Arc<T>,
    cache: Arc<ResponseCache>,
}

impl<T: CatalogTransport> CachedFetchClient<T> {
    pub fn new(transport: Arc<T>, config: CacheConfig) -> Self {
        Self {
            transport,
            cache: Arc::new(ResponseCache::new(config)),
        }
    }

    /// Build a client over an existing cache table.
    pub fn with_cache(transport: Arc<T>, cache: Arc<ResponseCache>) -> Self {
        Self { transport, cache }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Return the payload for `cache_key`, fetching `url` when the cached
    /// entry is missing or older than the TTL.
    ///
    /// Failed requests are logged and returned; nothing is cached for them.
    pub async fn fetch_with_cache(
        &self,
        url: &str,
        cache_key: &str,
    ) -> Result<CacheRead<Value>, CatalogError> {
        if let Some(read) = self.cache.get(cache_key) {
            tracing::trace!(cache_key, "catalog cache hit");
            return Ok(read);
        }

        match self.transport.get_json(url).await {
            Ok(payload) => {
                let fetched_at = self.cache.put(cache_key, payload.clone());
                Ok(CacheRead::from_network(payload, fetched_at))
            }
            Err(e) => {
                tracing::error!(url, cache_key, error = %e, "catalog fetch failed");
                Err(e)
            }
        }
    }

    /// Always go to the network. Used for search and random picks.
    pub async fn fetch_uncached(&self, url: &str) -> Result<Value, CatalogError> {
        self.transport.get_json(url).await.inspect_err(|e| {
            tracing::error!(url, error = %e, "catalog fetch failed");
        })
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<T: CatalogTransport> Clone for CachedFetchClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every GET with `{"url": <url>, "n": <call number>}`.
    #[derive(Default)]
    struct CountingTransport {
        calls: AtomicUsize,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl CatalogTransport for CountingTransport {
        async fn get_json(&self, url: &str) -> Result<Value, CatalogError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(status) = self.fail_with {
                return Err(CatalogError::RequestFailed {
                    url: url.to_string(),
                    status,
                });
            }
            Ok(json!({ "url": url, "n": n }))
        }
    }

    fn client(transport: CountingTransport) -> CachedFetchClient<CountingTransport> {
        CachedFetchClient::new(Arc::new(transport), CacheConfig::default())
    }

    #[tokio::test]
    async fn test_second_fetch_within_ttl_is_served_from_cache() {
        let client = client(CountingTransport::default());

        let first = client.fetch_with_cache("https://x/a", "a").await.unwrap();
        let second = client.fetch_with_cache("https://x/a", "a").await.unwrap();

        assert!(first.was_cache_miss());
        assert!(second.was_cache_hit());
        assert_eq!(first.value(), second.value());
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_one_refetch() {
        let client = client(CountingTransport::default());
        let stale = chrono::Utc::now() - chrono::Duration::milliseconds(3_600_001);
        client.cache().put_at("a", json!({ "old": true }), stale);

        let read = client.fetch_with_cache("https://x/a", "a").await.unwrap();
        assert!(read.was_cache_miss());
        assert_eq!(read.value()["n"], json!(1));
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 1);

        client.fetch_with_cache("https://x/a", "a").await.unwrap();
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let client = client(CountingTransport {
            fail_with: Some(500),
            ..Default::default()
        });

        let err = client.fetch_with_cache("https://x/a", "a").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(client.cache().entry("a").is_none());

        client.fetch_with_cache("https://x/a", "a").await.unwrap_err();
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_uncached_fetch_always_hits_network() {
        let client = client(CountingTransport::default());
        client.fetch_uncached("https://x/random").await.unwrap();
        client.fetch_uncached("https://x/random").await.unwrap();
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 2);
        assert!(client.cache().is_empty());
    }

    #[tokio::test]
    async fn test_clear_cache_forces_refetch() {
        let client = client(CountingTransport::default());
        client.fetch_with_cache("https://x/a", "a").await.unwrap();
        client.clear_cache();
        client.fetch_with_cache("https://x/a", "a").await.unwrap();
        assert_eq!(client.transport().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clones_share_the_table() {
        let client = client(CountingTransport::default());
        let other = client.clone();
        client.fetch_with_cache("https://x/a", "a").await.unwrap();
        assert!(other.fetch_with_cache("https://x/a", "a").await.unwrap().was_cache_hit());
    }
}
