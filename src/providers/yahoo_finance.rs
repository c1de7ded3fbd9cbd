use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::fundamentals::{PriceHistory, PricePoint};
use crate::core::provider::PriceHistoryProvider;
use super::util::{REQUEST_RETRIES, RETRY_DELAY_MS, with_retry};

/// Live quote and one year of daily closes from the Yahoo chart endpoint.
pub struct YahooFinanceProvider {
    base_url: String,
    symbol_suffix: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, symbol_suffix: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            symbol_suffix: symbol_suffix.to_string(),
        }
    }

    fn symbol(&self, ticker: &str) -> String {
        format!("{}{}", ticker.trim().to_uppercase(), self.symbol_suffix)
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

fn extract_closes(item: &ChartItem) -> Vec<PricePoint> {
    let (Some(timestamps), Some(closes)) = (
        item.timestamp.as_ref(),
        item.indicators
            .as_ref()
            .and_then(|inds| inds.quote.first())
            .and_then(|q| q.close.as_ref()),
    ) else {
        return Vec::new();
    };

    timestamps
        .iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let date = DateTime::from_timestamp(*ts, 0)?.date_naive();
            close.map(|close| PricePoint { date, close })
        })
        .collect()
}

#[async_trait]
impl PriceHistoryProvider for YahooFinanceProvider {
    #[instrument(name = "YahooHistoryFetch", skip(self), fields(ticker = %ticker))]
    async fn fetch_history(&self, ticker: &str) -> Result<PriceHistory> {
        let symbol = self.symbol(ticker);
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1y",
            self.base_url, symbol
        );
        debug!("Requesting price history from {}", url);

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
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse chart response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let closes = extract_closes(&item);
        debug!(points = closes.len(), "Parsed price history");
        Ok(PriceHistory {
            currency: item.meta.currency,
            current_price: item.meta.regular_market_price,
            closes,
        })
    }
}
