//! Injected key-value cache for externally fetched data.

use async_trait::async_trait;
use std::time::Duration;

/// Entries put with a TTL stop being returned once it elapses.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Option<V>;
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);
    async fn remove(&self, key: &K);
    async fn clear(&self);
}
