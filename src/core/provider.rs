//! Data acquisition seams. Implementations live in `crate::providers`.

use crate::core::fundamentals::{PriceHistory, RawFundamentals};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<RawFundamentals>;
}

#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(&self, ticker: &str) -> Result<PriceHistory>;
}
