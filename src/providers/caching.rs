use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::core::cache::Cache;
use crate::core::fundamentals::{PriceHistory, RawFundamentals};
use crate::core::provider::{FundamentalsProvider, PriceHistoryProvider};

/// Memoizes successful fetches of `inner` in an injected cache for `ttl`.
/// Failures are not cached so the next request retries.
pub struct CachingProvider<P, V> {
    inner: P,
    cache: Arc<dyn Cache<String, V>>,
    ttl: Duration,
}

impl<P, V> CachingProvider<P, V> {
    pub fn new(inner: P, cache: Arc<dyn Cache<String, V>>, ttl: Duration) -> Self {
        CachingProvider { inner, cache, ttl }
    }
}

fn cache_key(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

#[async_trait]
impl<P: FundamentalsProvider> FundamentalsProvider for CachingProvider<P, RawFundamentals> {
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<RawFundamentals> {
        let key = cache_key(ticker);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for fundamentals: {}", key);
            return Ok(cached);
        }
        let result = self.inner.fetch_fundamentals(ticker).await?;
        self.cache.put(key, result.clone(), Some(self.ttl)).await;
        Ok(result)
    }
}

#[async_trait]
impl<P: PriceHistoryProvider> PriceHistoryProvider for CachingProvider<P, PriceHistory> {
    async fn fetch_history(&self, ticker: &str) -> Result<PriceHistory> {
        let key = cache_key(ticker);
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Cache hit for price history: {}", key);
            return Ok(cached);
        }
        let result = self.inner.fetch_history(ticker).await?;
        self.cache.put(key, result.clone(), Some(self.ttl)).await;
        Ok(result)
    }
}
