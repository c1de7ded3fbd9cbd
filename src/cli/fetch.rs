//! Gathers raw data for a ticker from every configured source.

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::dcf::DcfInputs;
use crate::core::fundamentals::{Field, PriceHistory, RawFundamentals};
use crate::core::normalize::{DataNormalizer, NormalizationReport};
use crate::core::provider::{FundamentalsProvider, PriceHistoryProvider};
use crate::providers::alphavantage::AlphaVantageProvider;
use crate::providers::caching::CachingProvider;
use crate::providers::reference::ReferenceProvider;
use crate::providers::yahoo_finance::YahooFinanceProvider;
use crate::store::CacheStore;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source tag for a company no source knew anything about.
pub const NO_SOURCE: &str = "none";

const FUNDAMENTALS_CACHE: &str = "fundamentals";
const HISTORY_CACHE: &str = "price_history";

/// Fundamentals sources in priority order plus an optional quote source.
pub struct DataSources {
    fundamentals: Vec<Box<dyn FundamentalsProvider>>,
    history: Option<Box<dyn PriceHistoryProvider>>,
}

impl DataSources {
    pub fn new(
        fundamentals: Vec<Box<dyn FundamentalsProvider>>,
        history: Option<Box<dyn PriceHistoryProvider>>,
    ) -> Self {
        DataSources {
            fundamentals,
            history,
        }
    }

    /// Alpha Vantage first, then the reference snapshots; Yahoo for quotes.
    /// Live sources are cached in the configured store. `offline` keeps only
    /// the reference snapshots.
    pub fn from_config(config: &AppConfig, offline: bool) -> Self {
        let ttl = config.cache_ttl();
        let mut fundamentals: Vec<Box<dyn FundamentalsProvider>> = Vec::new();
        let mut history: Option<Box<dyn PriceHistoryProvider>> = None;

        let live = config.providers.alphavantage.is_some() || config.providers.yahoo.is_some();
        if !offline && live {
            let store = CacheStore::from_config(config);
            if let Some(av) = &config.providers.alphavantage {
                let cache: Arc<dyn Cache<String, RawFundamentals>> =
                    store.collection(FUNDAMENTALS_CACHE);
                fundamentals.push(Box::new(CachingProvider::new(
                    AlphaVantageProvider::new(&av.base_url, &av.api_key, &av.symbol_suffix),
                    cache,
                    ttl,
                )));
            }
            if let Some(yahoo) = &config.providers.yahoo {
                let cache: Arc<dyn Cache<String, PriceHistory>> = store.collection(HISTORY_CACHE);
                history = Some(Box::new(CachingProvider::new(
                    YahooFinanceProvider::new(&yahoo.base_url, &yahoo.symbol_suffix),
                    cache,
                    ttl,
                )));
            }
        }
        fundamentals.push(Box::new(ReferenceProvider::from_companies(
            &config.companies,
        )));

        DataSources::new(fundamentals, history)
    }

    /// Consolidated raw data for `ticker`. A failing source is logged and
    /// skipped; a ticker nobody knows yields an empty bag.
    pub async fn load_company(&self, config: &AppConfig, ticker: &str) -> CompanyData {
        let ticker = ticker.trim().to_uppercase();
        let (raw, history) = tokio::join!(
            self.fetch_fundamentals(&ticker),
            self.fetch_history(&ticker)
        );
        let mut raw = raw.unwrap_or_else(|| {
            warn!("No fundamentals source knows {}", ticker);
            RawFundamentals::new(NO_SOURCE)
        });

        if let Some(live) = history
            .as_ref()
            .and_then(|h| h.current_price)
            .filter(|p| p.is_finite() && *p > 0.0)
        {
            debug!(price = live, "Using live quote for {}", ticker);
            raw.set(Field::Price, Some(live));
        }

        let company = config.company(&ticker);
        if let Some(sector) = company.and_then(|c| c.sector.clone()) {
            raw.sector = Some(sector);
        }
        let name = company
            .and_then(|c| c.name.clone())
            .or_else(|| raw.name.clone());

        CompanyData {
            ticker,
            name,
            raw,
            history,
            dcf: company.and_then(|c| c.dcf),
        }
    }

    async fn fetch_fundamentals(&self, ticker: &str) -> Option<RawFundamentals> {
        for provider in &self.fundamentals {
            match provider.fetch_fundamentals(ticker).await {
                Ok(raw) => {
                    info!(source = %raw.source, "Fundamentals for {}", ticker);
                    return Some(raw);
                }
                Err(e) => warn!("Fundamentals source failed for {}: {}", ticker, e),
            }
        }
        None
    }

    async fn fetch_history(&self, ticker: &str) -> Option<PriceHistory> {
        let provider = self.history.as_ref()?;
        provider
            .fetch_history(ticker)
            .await
            .inspect_err(|e| warn!("Price history unavailable for {}: {}", ticker, e))
            .ok()
    }
}

/// Everything known about one company before normalization.
#[derive(Debug, Clone)]
pub struct CompanyData {
    pub ticker: String,
    pub name: Option<String>,
    pub raw: RawFundamentals,
    pub history: Option<PriceHistory>,
    pub dcf: Option<DcfInputs>,
}

impl CompanyData {
    pub fn normalize(&self, normalizer: &DataNormalizer) -> NormalizationReport {
        normalizer.normalize(&self.raw, self.history.as_ref())
    }

    pub fn title(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", self.ticker, name),
            None => self.ticker.clone(),
        }
    }
}

/// Loads the configuration from `config_path` or the default location.
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}
