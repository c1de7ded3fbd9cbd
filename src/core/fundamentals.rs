//! Fundamental data records: the untrusted input bag and its canonical form.

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Tag used when a bag comes from the configured reference snapshots.
pub const REFERENCE_SOURCE: &str = "reference";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Price,
    Eps,
    BookValuePerShare,
    PeRatio,
    PbRatio,
    DividendYield,
    Roe,
    Roa,
    NetMargin,
    EvToEbitda,
    Week52High,
    Week52Low,
}

/// How a field is expected to be scaled, which decides how it gets corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Price,
    /// Currency amount per share.
    PerShare,
    /// Yields, returns and margins; canonical form is a fraction.
    Fraction,
    /// Plain multiples such as P/E.
    Multiple,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Price,
        Field::Eps,
        Field::BookValuePerShare,
        Field::PeRatio,
        Field::PbRatio,
        Field::DividendYield,
        Field::Roe,
        Field::Roa,
        Field::NetMargin,
        Field::EvToEbitda,
        Field::Week52High,
        Field::Week52Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Price => "price",
            Field::Eps => "eps",
            Field::BookValuePerShare => "book_value_per_share",
            Field::PeRatio => "pe_ratio",
            Field::PbRatio => "pb_ratio",
            Field::DividendYield => "dividend_yield",
            Field::Roe => "roe",
            Field::Roa => "roa",
            Field::NetMargin => "net_margin",
            Field::EvToEbitda => "ev_to_ebitda",
            Field::Week52High => "week52_high",
            Field::Week52Low => "week52_low",
        }
    }

    pub fn class(&self) -> FieldClass {
        match self {
            Field::Price => FieldClass::Price,
            Field::Eps | Field::BookValuePerShare | Field::Week52High | Field::Week52Low => {
                FieldClass::PerShare
            }
            Field::DividendYield | Field::Roe | Field::Roa | Field::NetMargin => {
                FieldClass::Fraction
            }
            Field::PeRatio | Field::PbRatio | Field::EvToEbitda => FieldClass::Multiple,
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| anyhow!("Unknown fundamental field: {}", s))
    }
}

/// A bag of source-reported values. Nothing in here is trusted: values may be
/// percent instead of fraction, cents instead of units, or plain garbage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFundamentals {
    pub source: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub values: BTreeMap<Field, Option<f64>>,
}

impl RawFundamentals {
    pub fn new(source: &str) -> Self {
        RawFundamentals {
            source: source.to_string(),
            ..Default::default()
        }
    }

    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        self.values.insert(field, value);
    }

    /// The reported value, if any. Non-finite values are handed back as-is so
    /// the normalizer can report them.
    pub fn get(&self, field: Field) -> Option<f64> {
        self.values.get(&field).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes plus the live quote when the source had one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub currency: Option<String>,
    pub current_price: Option<f64>,
    pub closes: Vec<PricePoint>,
}

impl PriceHistory {
    /// Most recent usable close, regardless of the order points were supplied in.
    pub fn last_close(&self) -> Option<f64> {
        self.closes
            .iter()
            .filter(|p| p.close.is_finite() && p.close > 0.0)
            .max_by_key(|p| p.date)
            .map(|p| p.close)
    }
}

/// Canonical per-company record. Yields, returns and margins are fractions;
/// P/E, P/B and EV/EBITDA are plain multiples. Every present value has passed
/// its plausibility band.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedFundamentals {
    pub price: Option<f64>,
    pub eps: Option<f64>,
    pub book_value_per_share: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub net_margin: Option<f64>,
    pub ev_to_ebitda: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub sector: Option<String>,
}

impl NormalizedFundamentals {
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Price => self.price,
            Field::Eps => self.eps,
            Field::BookValuePerShare => self.book_value_per_share,
            Field::PeRatio => self.pe_ratio,
            Field::PbRatio => self.pb_ratio,
            Field::DividendYield => self.dividend_yield,
            Field::Roe => self.roe,
            Field::Roa => self.roa,
            Field::NetMargin => self.net_margin,
            Field::EvToEbitda => self.ev_to_ebitda,
            Field::Week52High => self.week52_high,
            Field::Week52Low => self.week52_low,
        }
    }

    pub(crate) fn slot(&mut self, field: Field) -> &mut Option<f64> {
        match field {
            Field::Price => &mut self.price,
            Field::Eps => &mut self.eps,
            Field::BookValuePerShare => &mut self.book_value_per_share,
            Field::PeRatio => &mut self.pe_ratio,
            Field::PbRatio => &mut self.pb_ratio,
            Field::DividendYield => &mut self.dividend_yield,
            Field::Roe => &mut self.roe,
            Field::Roa => &mut self.roa,
            Field::NetMargin => &mut self.net_margin,
            Field::EvToEbitda => &mut self.ev_to_ebitda,
            Field::Week52High => &mut self.week52_high,
            Field::Week52Low => &mut self.week52_low,
        }
    }
}
