use crate::core::dcf::DcfInputs;
use crate::core::fundamentals::{Field, REFERENCE_SOURCE, RawFundamentals};
use crate::core::normalize::NormalizationConfig;
use crate::core::sector::{SectorBenchmarkTable, SectorsConfig};
use crate::core::sensitivity::SensitivityGrid;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_persist_cache() -> bool {
    true
}

fn default_yahoo_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_alphavantage_base_url() -> String {
    "https://www.alphavantage.co".to_string()
}

/// A company known up front, with an optional reference snapshot used when no
/// live fundamentals are available.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompanyConfig {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    /// Tag the snapshot is normalized under; defaults to `reference`.
    pub source: Option<String>,
    #[serde(default)]
    pub fundamentals: BTreeMap<Field, f64>,
    pub dcf: Option<DcfInputs>,
}

impl CompanyConfig {
    pub fn reference_snapshot(&self) -> RawFundamentals {
        RawFundamentals {
            source: self
                .source
                .clone()
                .unwrap_or_else(|| REFERENCE_SOURCE.to_string()),
            name: self.name.clone(),
            sector: self.sector.clone(),
            values: self
                .fundamentals
                .iter()
                .map(|(field, value)| (*field, Some(*value)))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct YahooProviderConfig {
    #[serde(default = "default_yahoo_base_url")]
    pub base_url: String,
    /// Appended to tickers, e.g. `.SA` for B3 listings.
    #[serde(default)]
    pub symbol_suffix: String,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        YahooProviderConfig {
            base_url: default_yahoo_base_url(),
            symbol_suffix: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AlphaVantageProviderConfig {
    #[serde(default = "default_alphavantage_base_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub symbol_suffix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub alphavantage: Option<AlphaVantageProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig::default()),
            alphavantage: None,
        }
    }
}

/// Defaults for the dividend model, in percent as typed on the command line.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ValuationConfig {
    pub growth_rate_pct: f64,
    pub required_return_pct: f64,
    pub sensitivity: SensitivityGrid,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        ValuationConfig {
            growth_rate_pct: 5.0,
            required_return_pct: 12.0,
            sensitivity: SensitivityGrid::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    /// Replaces the built-in sector table when present.
    pub sectors: Option<SectorsConfig>,
    #[serde(default)]
    pub valuation: ValuationConfig,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Keep fetched data on disk between runs instead of in memory only.
    #[serde(default = "default_persist_cache")]
    pub persist_cache: bool,
    /// Directory of the on-disk cache; defaults to the platform cache dir.
    pub cache_path: Option<String>,
    #[serde(default)]
    pub companies: Vec<CompanyConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            currency: default_currency(),
            providers: ProvidersConfig::default(),
            normalization: NormalizationConfig::default(),
            sectors: None,
            valuation: ValuationConfig::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            persist_cache: default_persist_cache(),
            cache_path: None,
            companies: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fairval", "fairval")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn default_cache_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.cache_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "fairval", "fairval")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.cache_dir().to_path_buf())
    }

    pub fn sector_table(&self) -> SectorBenchmarkTable {
        match &self.sectors {
            Some(sectors) => SectorBenchmarkTable::from_config(sectors),
            None => SectorBenchmarkTable::builtin().clone(),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn company(&self, ticker: &str) -> Option<&CompanyConfig> {
        self.companies
            .iter()
            .find(|c| c.ticker.eq_ignore_ascii_case(ticker.trim()))
    }
}
