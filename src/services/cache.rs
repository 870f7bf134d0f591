// src/services/cache.rs
// DOCUMENTATION: Simple in-memory cache for aggregate query results
// PURPOSE: The stats and monthly-plan endpoints scan every tour; their
// results change slowly, so responses are held for a short TTL

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry {
    data: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: Value, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe TTL cache for serialized aggregate responses
pub struct AggregateCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    default_ttl: Duration,
}

impl AggregateCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let store = self.store.read().await;

        if let Some(entry) = store.get(key) {
            if !entry.is_expired() {
                log::debug!("Cache HIT for key: {}", key);
                return Some(entry.data.clone());
            }
            log::debug!("Cache EXPIRED for key: {}", key);
        } else {
            log::debug!("Cache MISS for key: {}", key);
        }

        None
    }

    pub async fn set(&self, key: String, value: Value) {
        let mut store = self.store.write().await;
        store.insert(key.clone(), CacheEntry::new(value, self.default_ttl));
        log::debug!(
            "Cache SET for key: {} (TTL: {}s)",
            key,
            self.default_ttl.as_secs()
        );
    }

    /// Drop entries for the given prefix (e.g. after a tour mutation)
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut store = self.store.write().await;
        store.retain(|key, _| !key.starts_with(prefix));
    }

    /// Clear expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }
}

/// Start background cleanup task
/// Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<AggregateCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn cache_set_get() {
        let cache = AggregateCache::new(60);
        cache.set("tour-stats".to_string(), json!([{"difficulty": "EASY"}])).await;

        let result = cache.get("tour-stats").await;
        assert_eq!(result, Some(json!([{"difficulty": "EASY"}])));
    }

    #[tokio::test]
    async fn cache_expiration() {
        let cache = AggregateCache::new(1);
        cache.set("k".to_string(), json!(1)).await;

        assert!(cache.get("k").await.is_some());

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn cache_cleanup_removes_expired() {
        let cache = AggregateCache::new(1);
        cache.set("k1".to_string(), json!(1)).await;
        cache.set("k2".to_string(), json!(2)).await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        cache.cleanup().await;

        assert!(cache.store.read().await.is_empty());
    }

    #[tokio::test]
    async fn invalidate_prefix_is_selective() {
        let cache = AggregateCache::new(60);
        cache.set("monthly-plan:2024".to_string(), json!(1)).await;
        cache.set("monthly-plan:2025".to_string(), json!(2)).await;
        cache.set("tour-stats".to_string(), json!(3)).await;

        cache.invalidate_prefix("monthly-plan:").await;

        assert!(cache.get("monthly-plan:2024").await.is_none());
        assert!(cache.get("monthly-plan:2025").await.is_none());
        assert!(cache.get("tour-stats").await.is_some());
    }
}
