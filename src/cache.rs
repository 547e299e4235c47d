use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key for a category's published batch.
pub fn news_key(category: &str) -> String {
    format!("news:{category}")
}

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

/// Process-wide key-value store with optional per-key expiry.
///
/// Values are opaque strings; the aggregation pipeline stores JSON-encoded
/// item arrays under `news:<category>`. An expired entry reads as a miss.
#[derive(Clone)]
pub struct NewsCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl NewsCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.read().await;
        let entry = map.get(key)?;
        if let Some(expires_at) = entry.expires_at {
            if Instant::now() >= expires_at {
                debug!("cache entry {key} expired");
                return None;
            }
        }
        Some(entry.value.clone())
    }

    pub async fn set(&self, key: &str, value: String) {
        let mut map = self.inner.write().await;
        map.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: None,
            },
        );
    }

    pub async fn setex(&self, key: &str, value: String, ttl: Duration) {
        let mut map = self.inner.write().await;
        map.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
    }
}

impl Default for NewsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = NewsCache::new();
        cache.set("news:tech", "[]".to_string()).await;
        assert_eq!(cache.get("news:tech").await.as_deref(), Some("[]"));
        assert_eq!(cache.get("news:ai").await, None);
    }

    #[tokio::test]
    async fn setex_expires() {
        let cache = NewsCache::new();
        cache
            .setex("news:tech", "[1]".to_string(), Duration::from_millis(40))
            .await;
        assert!(cache.get("news:tech").await.is_some());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("news:tech").await, None);
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_ttl() {
        let cache = NewsCache::new();
        cache
            .setex("k", "old".to_string(), Duration::from_millis(10))
            .await;
        cache
            .setex("k", "new".to_string(), Duration::from_secs(60))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("new"));
    }
}
