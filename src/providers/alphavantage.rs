use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::fundamentals::{Field, RawFundamentals};
use crate::core::provider::FundamentalsProvider;
use super::util::{REQUEST_RETRIES, RETRY_DELAY_MS, with_retry};

pub const SOURCE: &str = "alphavantage";

/// Company overview from the Alpha Vantage `OVERVIEW` function.
pub struct AlphaVantageProvider {
    base_url: String,
    api_key: String,
    symbol_suffix: String,
}

impl AlphaVantageProvider {
    pub fn new(base_url: &str, api_key: &str, symbol_suffix: &str) -> Self {
        AlphaVantageProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            symbol_suffix: symbol_suffix.to_string(),
        }
    }
}

/// Alpha Vantage sends every number as a string and uses "None" or "-" for
/// missing values.
#[derive(Deserialize, Debug)]
struct Overview {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "EPS")]
    eps: Option<String>,
    #[serde(rename = "BookValue")]
    book_value: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "PriceToBookRatio")]
    pb_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    dividend_yield: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    roe: Option<String>,
    #[serde(rename = "ReturnOnAssetsTTM")]
    roa: Option<String>,
    #[serde(rename = "ProfitMargin")]
    profit_margin: Option<String>,
    #[serde(rename = "EVToEBITDA")]
    ev_to_ebitda: Option<String>,
    #[serde(rename = "52WeekHigh")]
    week52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    week52_low: Option<String>,
}

fn parse_number(value: Option<&String>) -> Option<f64> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && *v != "None" && *v != "-")
        .and_then(|v| v.parse::<f64>().ok())
}

impl Overview {
    fn into_raw(self) -> RawFundamentals {
        let mut raw = RawFundamentals::new(SOURCE);
        for (field, value) in [
            (Field::Eps, &self.eps),
            (Field::BookValuePerShare, &self.book_value),
            (Field::PeRatio, &self.pe_ratio),
            (Field::PbRatio, &self.pb_ratio),
            (Field::DividendYield, &self.dividend_yield),
            (Field::Roe, &self.roe),
            (Field::Roa, &self.roa),
            (Field::NetMargin, &self.profit_margin),
            (Field::EvToEbitda, &self.ev_to_ebitda),
            (Field::Week52High, &self.week52_high),
            (Field::Week52Low, &self.week52_low),
        ] {
            raw.set(field, parse_number(value.as_ref()));
        }
        raw.name = self.name;
        raw.sector = self.sector;
        raw
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageProvider {
    #[instrument(name = "AlphaVantageOverview", skip(self), fields(ticker = %ticker))]
    async fn fetch_fundamentals(&self, ticker: &str) -> Result<RawFundamentals> {
        let symbol = format!("{}{}", ticker.trim().to_uppercase(), self.symbol_suffix);
        let url = format!(
            "{}/query?function=OVERVIEW&symbol={}&apikey={}",
            self.base_url, symbol, self.api_key
        );
        debug!("Requesting company overview for {}", symbol);

        let client = reqwest::Client::builder()
            .user_agent("fairval/0.1")
            .build()?;
        let response = with_retry(
            || client.get(&url).send(),
            REQUEST_RETRIES,
            RETRY_DELAY_MS,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for symbol: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let overview: Overview = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse overview for {}: {}", symbol, e))?;

        // Unknown symbols and rate-limit notices come back as 200 without a Symbol.
        if overview.symbol.is_none() {
            return Err(anyhow!("No overview data found for symbol: {}", symbol));
        }
        Ok(overview.into_raw())
    }
}
