use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

use crate::core::config::CompanyConfig;
use crate::core::fundamentals::RawFundamentals;
use crate::core::provider::FundamentalsProvider;

/// Serves the snapshots listed under `companies` in the configuration.
#[derive(Debug, Clone, Default)]
pub struct ReferenceProvider {
    snapshots: HashMap<String, RawFundamentals>,
}

impl ReferenceProvider {
    pub fn from_companies(companies: &[CompanyConfig]) -> Self {
        let snapshots = companies
            .iter()
            .filter(|c| !c.fundamentals.is_empty())
            .map(|c| (c.ticker.trim().to_uppercase(), c.reference_snapshot()))
            .collect();
        ReferenceProvider { snapshots }
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.snapshots.contains_key(&ticker.trim().to_uppercase())
    }
}

#[async_trait]
impl FundamentalsProvider for ReferenceProvider {
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<RawFundamentals> {
        debug!(ticker, "Looking up reference snapshot");
        self.snapshots
            .get(&ticker.trim().to_uppercase())
            .cloned()
            .ok_or_else(|| anyhow!("No reference snapshot for ticker: {}", ticker))
    }
}
