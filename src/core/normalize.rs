//! Turns untrusted fundamentals bags into [`NormalizedFundamentals`].
//!
//! Correction happens per field class: per-share amounts that look like cents
//! are rescaled, yields and returns that look like percentages are divided by
//! 100, and multiples outside their band are recomputed from price and the
//! matching per-share figure. Anything that still falls outside its band is
//! dropped. Normalization never fails; every change is listed in the returned
//! [`NormalizationReport`].

use crate::core::band::Band;
use crate::core::error::ValuationError;
use crate::core::fundamentals::{
    Field, FieldClass, NormalizedFundamentals, PriceHistory, RawFundamentals,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use tracing::{debug, warn};

/// Plausibility limits shared by all sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationPolicy {
    /// Per-share amounts above this magnitude are presumed mis-scaled.
    pub per_share_ceiling: f64,
    /// Factor applied to a mis-scaled per-share amount.
    pub per_share_rescale: f64,
    /// Dividend yields above this, after percent correction, are dropped.
    pub dividend_yield_ceiling: f64,
    pub pe_band: Band,
    pub pb_band: Band,
    /// Applies to ROE, ROA and net margin.
    pub return_band: Band,
    pub ev_to_ebitda_band: Band,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        NormalizationPolicy {
            per_share_ceiling: 1000.0,
            per_share_rescale: 0.01,
            dividend_yield_ceiling: 0.5,
            pe_band: Band::new(1.0, 100.0),
            pb_band: Band::new(0.05, 20.0),
            return_band: Band::new(-1.0, 1.0),
            ev_to_ebitda_band: Band::new(0.1, 200.0),
        }
    }
}

/// Unit contract for one source. Unset hints fall back to inferring scale
/// from magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceHints {
    /// `Some(true)`: yields, returns and margins are always percentages.
    /// `Some(false)`: they are always fractions.
    pub percent_yields: Option<bool>,
    /// Confirmed multiplier for per-share amounts, e.g. `0.01` for cents.
    pub per_share_scale: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub policy: NormalizationPolicy,
    #[serde(default)]
    pub sources: HashMap<String, SourceHints>,
}

/// A single change made while normalizing.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjustment {
    Rescaled { field: Field, from: f64, to: f64 },
    PercentToFraction { field: Field, from: f64, to: f64 },
    /// Computed from other fields; `replaced` holds the rejected source value.
    Derived {
        field: Field,
        value: f64,
        replaced: Option<f64>,
    },
    PriceFromHistory { value: f64 },
    Discarded { field: Field, reason: ValuationError },
}

impl Adjustment {
    pub fn field(&self) -> Field {
        match self {
            Adjustment::Rescaled { field, .. }
            | Adjustment::PercentToFraction { field, .. }
            | Adjustment::Derived { field, .. }
            | Adjustment::Discarded { field, .. } => *field,
            Adjustment::PriceFromHistory { .. } => Field::Price,
        }
    }
}

impl Display for Adjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Adjustment::Rescaled { from, to, .. } => write!(f, "rescaled {from} -> {to}"),
            Adjustment::PercentToFraction { from, to, .. } => {
                write!(f, "percent to fraction {from} -> {to}")
            }
            Adjustment::Derived {
                value,
                replaced: Some(reported),
                ..
            } => write!(f, "recomputed {value:.4} (reported {reported})"),
            Adjustment::Derived { value, .. } => write!(f, "derived {value:.4}"),
            Adjustment::PriceFromHistory { value } => {
                write!(f, "last historical close {value}")
            }
            Adjustment::Discarded { reason, .. } => write!(f, "discarded: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport {
    pub source: String,
    pub fundamentals: NormalizedFundamentals,
    pub adjustments: Vec<Adjustment>,
}

impl NormalizationReport {
    pub fn adjustments_for(&self, field: Field) -> impl Iterator<Item = &Adjustment> {
        self.adjustments.iter().filter(move |a| a.field() == field)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DataNormalizer {
    policy: NormalizationPolicy,
    sources: HashMap<String, SourceHints>,
}

impl DataNormalizer {
    pub fn new(policy: NormalizationPolicy) -> Self {
        DataNormalizer {
            policy,
            sources: HashMap::new(),
        }
    }

    pub fn from_config(config: &NormalizationConfig) -> Self {
        DataNormalizer {
            policy: config.policy.clone(),
            sources: config.sources.clone(),
        }
    }

    pub fn with_source_hints(mut self, source: &str, hints: SourceHints) -> Self {
        self.sources.insert(source.to_string(), hints);
        self
    }

    pub fn policy(&self) -> &NormalizationPolicy {
        &self.policy
    }

    pub fn hints_for(&self, source: &str) -> SourceHints {
        self.sources.get(source).copied().unwrap_or_default()
    }

    /// Normalizes `raw`, using `history` only when no usable price was reported.
    pub fn normalize(
        &self,
        raw: &RawFundamentals,
        history: Option<&PriceHistory>,
    ) -> NormalizationReport {
        let mut pass = Pass {
            policy: &self.policy,
            hints: self.hints_for(&raw.source),
            out: NormalizedFundamentals {
                sector: clean_sector(raw.sector.as_deref()),
                ..Default::default()
            },
            adjustments: Vec::new(),
        };

        pass.price(raw.get(Field::Price), history);
        for field in Field::ALL {
            let Some(value) = raw.get(field) else {
                continue;
            };
            match field.class() {
                FieldClass::Price => {}
                FieldClass::PerShare => pass.per_share(field, value),
                FieldClass::Fraction => pass.fraction(field, value),
                FieldClass::Multiple => pass.multiple(field, value),
            }
        }

        pass.derive_per_share(Field::Eps, Field::PeRatio);
        pass.derive_per_share(Field::BookValuePerShare, Field::PbRatio);
        pass.derive_multiple(Field::PeRatio, Field::Eps, raw.get(Field::PeRatio));
        pass.derive_multiple(
            Field::PbRatio,
            Field::BookValuePerShare,
            raw.get(Field::PbRatio),
        );

        debug!(
            source = %raw.source,
            adjustments = pass.adjustments.len(),
            "Normalized fundamentals"
        );
        NormalizationReport {
            source: raw.source.clone(),
            fundamentals: pass.out,
            adjustments: pass.adjustments,
        }
    }
}

fn clean_sector(sector: Option<&str>) -> Option<String> {
    sector
        .map(str::trim)
        .filter(|s| !s.is_empty() && !matches!(s.to_uppercase().as_str(), "N/A" | "NONE" | "-"))
        .map(str::to_string)
}

struct Pass<'a> {
    policy: &'a NormalizationPolicy,
    hints: SourceHints,
    out: NormalizedFundamentals,
    adjustments: Vec<Adjustment>,
}

impl Pass<'_> {
    fn record(&mut self, adjustment: Adjustment) {
        debug!(field = %adjustment.field(), "{adjustment}");
        self.adjustments.push(adjustment);
    }

    fn discard(&mut self, field: Field, value: f64, band: Band) {
        let reason = ValuationError::ImplausibleData {
            field: field.as_str(),
            value,
            band,
        };
        warn!(%field, %reason, "Dropping implausible value");
        self.record(Adjustment::Discarded { field, reason });
    }

    /// Keeps `value` if it lies in `band`, otherwise records the discard.
    fn accept(&mut self, field: Field, value: f64, band: Band) -> bool {
        if band.contains(value) {
            *self.out.slot(field) = Some(value);
            true
        } else {
            self.discard(field, value, band);
            false
        }
    }

    fn price(&mut self, reported: Option<f64>, history: Option<&PriceHistory>) {
        if let Some(value) = reported {
            if self.accept(Field::Price, value, Band::positive()) {
                return;
            }
        }
        if let Some(close) = history.and_then(PriceHistory::last_close) {
            self.out.price = Some(close);
            self.record(Adjustment::PriceFromHistory { value: close });
        }
    }

    fn per_share_band(&self, field: Field) -> Band {
        let ceiling = self.policy.per_share_ceiling;
        match field {
            Field::Week52High | Field::Week52Low => Band::new(f64::MIN_POSITIVE, ceiling),
            _ => Band::new(-ceiling, ceiling),
        }
    }

    fn per_share(&mut self, field: Field, value: f64) {
        let factor = match self.hints.per_share_scale {
            Some(scale) => Some(scale),
            None if value.abs() > self.policy.per_share_ceiling => {
                Some(self.policy.per_share_rescale)
            }
            None => None,
        };
        let corrected = match factor {
            Some(factor) if value.is_finite() && factor != 1.0 => {
                let to = value * factor;
                self.record(Adjustment::Rescaled {
                    field,
                    from: value,
                    to,
                });
                to
            }
            _ => value,
        };
        let band = self.per_share_band(field);
        self.accept(field, corrected, band);
    }

    fn fraction(&mut self, field: Field, value: f64) {
        let percent = self
            .hints
            .percent_yields
            .unwrap_or_else(|| value.abs() > 1.0);
        let corrected = if percent && value.is_finite() {
            let to = value / 100.0;
            self.record(Adjustment::PercentToFraction {
                field,
                from: value,
                to,
            });
            to
        } else {
            value
        };
        let band = match field {
            Field::DividendYield => Band::new(0.0, self.policy.dividend_yield_ceiling),
            _ => self.policy.return_band,
        };
        self.accept(field, corrected, band);
    }

    fn multiple_band(&self, field: Field) -> Band {
        match field {
            Field::PeRatio => self.policy.pe_band,
            Field::PbRatio => self.policy.pb_band,
            _ => self.policy.ev_to_ebitda_band,
        }
    }

    fn multiple(&mut self, field: Field, value: f64) {
        let band = self.multiple_band(field);
        self.accept(field, value, band);
    }

    /// Fills a missing per-share figure as `price / multiple`.
    fn derive_per_share(&mut self, field: Field, multiple: Field) {
        if self.out.get(field).is_some() {
            return;
        }
        let (Some(price), Some(ratio)) = (self.out.price, self.out.get(multiple)) else {
            return;
        };
        let value = price / ratio;
        let band = self.per_share_band(field);
        if band.contains(value) {
            *self.out.slot(field) = Some(value);
            self.record(Adjustment::Derived {
                field,
                value,
                replaced: None,
            });
        }
    }

    /// Fills a missing or rejected multiple as `price / per_share`.
    fn derive_multiple(&mut self, field: Field, per_share: Field, reported: Option<f64>) {
        if self.out.get(field).is_some() {
            return;
        }
        let (Some(price), Some(denominator)) = (self.out.price, self.out.get(per_share)) else {
            return;
        };
        if denominator == 0.0 {
            self.record(Adjustment::Discarded {
                field,
                reason: ValuationError::ArithmeticError {
                    field: per_share.as_str(),
                    value: denominator,
                },
            });
            return;
        }
        let value = price / denominator;
        let band = self.multiple_band(field);
        if band.contains(value) {
            *self.out.slot(field) = Some(value);
            self.record(Adjustment::Derived {
                field,
                value,
                replaced: reported,
            });
        } else {
            debug!(%field, value, "Recomputed multiple is still implausible");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fundamentals::PricePoint;
    use chrono::NaiveDate;

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("value should be present");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn normalize(raw: &RawFundamentals) -> NormalizationReport {
        DataNormalizer::default().normalize(raw, None)
    }

    #[test]
    fn test_percent_dividend_yield_and_cents_book_value() {
        let raw = RawFundamentals::new("scraper")
            .with(Field::Price, 35.0)
            .with(Field::DividendYield, 17.68)
            .with(Field::BookValuePerShare, 3000.0);

        let report = normalize(&raw);

        assert_close(report.fundamentals.dividend_yield, 0.1768);
        assert_close(report.fundamentals.book_value_per_share, 30.0);
        assert!(report.adjustments.contains(&Adjustment::PercentToFraction {
            field: Field::DividendYield,
            from: 17.68,
            to: 17.68 / 100.0,
        }));
        assert!(report.adjustments.contains(&Adjustment::Rescaled {
            field: Field::BookValuePerShare,
            from: 3000.0,
            to: 3000.0 * 0.01,
        }));
    }

    #[test]
    fn test_dividend_yield_rules_hold_across_inputs() {
        for raw_yield in [0.0, 0.03, 0.49, 0.5, 0.7, 1.0, 1.5, 7.0, 49.0, 50.0, 60.0, 250.0] {
            let raw = RawFundamentals::new("any").with(Field::DividendYield, raw_yield);
            let normalized = normalize(&raw).fundamentals.dividend_yield;

            let expected = if raw_yield > 1.0 {
                raw_yield / 100.0
            } else {
                raw_yield
            };
            if expected > 0.5 {
                assert_eq!(normalized, None, "raw yield {raw_yield}");
            } else {
                assert_close(normalized, expected);
            }
        }
    }

    #[test]
    fn test_negative_dividend_yield_is_dropped() {
        let raw = RawFundamentals::new("any").with(Field::DividendYield, -0.02);
        let report = normalize(&raw);
        assert_eq!(report.fundamentals.dividend_yield, None);
        assert!(matches!(
            report.adjustments.as_slice(),
            [Adjustment::Discarded {
                field: Field::DividendYield,
                ..
            }]
        ));
    }

    #[test]
    fn test_returns_and_margins_are_fractions() {
        let raw = RawFundamentals::new("any")
            .with(Field::Roe, 28.0)
            .with(Field::Roa, 0.09)
            .with(Field::NetMargin, -3.0);
        let n = normalize(&raw).fundamentals;
        assert_close(n.roe, 0.28);
        assert_close(n.roa, 0.09);
        assert_close(n.net_margin, -0.03);
    }

    #[test]
    fn test_return_beyond_band_after_correction_is_dropped() {
        let raw = RawFundamentals::new("any").with(Field::Roe, 450.0);
        assert_eq!(normalize(&raw).fundamentals.roe, None);
    }

    #[test]
    fn test_per_share_still_out_of_band_after_rescale_is_dropped() {
        let raw = RawFundamentals::new("any").with(Field::Eps, 250_000.0);
        let report = normalize(&raw);
        assert_eq!(report.fundamentals.eps, None);
        assert_eq!(report.adjustments.len(), 2);
    }

    #[test]
    fn test_derives_book_value_and_eps_from_multiples() {
        let raw = RawFundamentals::new("any")
            .with(Field::Price, 30.0)
            .with(Field::PbRatio, 1.5)
            .with(Field::PeRatio, 10.0);
        let report = normalize(&raw);
        assert_close(report.fundamentals.book_value_per_share, 20.0);
        assert_close(report.fundamentals.eps, 3.0);
        assert_close(report.fundamentals.pe_ratio, 10.0);
        assert_close(report.fundamentals.pb_ratio, 1.5);
    }

    #[test]
    fn test_implausible_multiple_is_recomputed_from_price() {
        let raw = RawFundamentals::new("any")
            .with(Field::Price, 30.0)
            .with(Field::Eps, 3.0)
            .with(Field::PeRatio, 450.0)
            .with(Field::BookValuePerShare, 20.0)
            .with(Field::PbRatio, 0.0);
        let report = normalize(&raw);

        assert_close(report.fundamentals.pe_ratio, 10.0);
        assert_close(report.fundamentals.pb_ratio, 1.5);
        assert!(report.adjustments.contains(&Adjustment::Derived {
            field: Field::PeRatio,
            value: 10.0,
            replaced: Some(450.0),
        }));
    }

    #[test]
    fn test_negative_earnings_leave_pe_absent() {
        let raw = RawFundamentals::new("any")
            .with(Field::Price, 9.0)
            .with(Field::Eps, -0.32)
            .with(Field::PeRatio, -15.2);
        let n = normalize(&raw).fundamentals;
        assert_close(n.eps, -0.32);
        assert_eq!(n.pe_ratio, None);
    }

    #[test]
    fn test_zero_eps_cannot_derive_pe() {
        let raw = RawFundamentals::new("any")
            .with(Field::Price, 10.0)
            .with(Field::Eps, 0.0);
        let report = normalize(&raw);
        assert_eq!(report.fundamentals.pe_ratio, None);
        assert!(report.adjustments.contains(&Adjustment::Discarded {
            field: Field::PeRatio,
            reason: ValuationError::ArithmeticError {
                field: "eps",
                value: 0.0,
            },
        }));
    }

    #[test]
    fn test_price_falls_back_to_last_close() {
        let history = PriceHistory {
            currency: None,
            current_price: None,
            closes: vec![
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                    close: 31.0,
                },
                PricePoint {
                    date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                    close: 32.5,
                },
            ],
        };
        let raw = RawFundamentals::new("any").with(Field::Price, -1.0);
        let report = DataNormalizer::default().normalize(&raw, Some(&history));
        assert_close(report.fundamentals.price, 32.5);
        assert!(
            report
                .adjustments
                .contains(&Adjustment::PriceFromHistory { value: 32.5 })
        );
    }

    #[test]
    fn test_reported_price_wins_over_history() {
        let history = PriceHistory {
            current_price: None,
            currency: None,
            closes: vec![PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                close: 32.5,
            }],
        };
        let raw = RawFundamentals::new("any").with(Field::Price, 33.0);
        let report = DataNormalizer::default().normalize(&raw, Some(&history));
        assert_close(report.fundamentals.price, 33.0);
        assert!(report.adjustments.is_empty());
    }

    #[test]
    fn test_source_hints_override_magnitude_inference() {
        let normalizer = DataNormalizer::default()
            .with_source_hints(
                "alphavantage",
                SourceHints {
                    percent_yields: Some(false),
                    per_share_scale: None,
                },
            )
            .with_source_hints(
                "cents_feed",
                SourceHints {
                    percent_yields: Some(true),
                    per_share_scale: Some(0.01),
                },
            );

        let av = RawFundamentals::new("alphavantage").with(Field::Roe, 0.8);
        assert_close(normalizer.normalize(&av, None).fundamentals.roe, 0.8);

        let cents = RawFundamentals::new("cents_feed")
            .with(Field::Eps, 820.0)
            .with(Field::DividendYield, 0.9);
        let n = normalizer.normalize(&cents, None).fundamentals;
        assert_close(n.eps, 8.2);
        assert_close(n.dividend_yield, 0.009);
    }

    #[test]
    fn test_present_values_respect_bands() {
        let raw = RawFundamentals::new("garbage")
            .with(Field::Price, 12.0)
            .with(Field::Eps, f64::NAN)
            .with(Field::PeRatio, 0.2)
            .with(Field::PbRatio, 75.0)
            .with(Field::EvToEbitda, -4.0)
            .with(Field::Week52High, 0.0)
            .with(Field::DividendYield, 0.75);
        let n = normalize(&raw).fundamentals;

        assert_close(n.price, 12.0);
        assert_eq!(n.eps, None);
        assert_eq!(n.pe_ratio, None);
        assert_eq!(n.pb_ratio, None);
        assert_eq!(n.ev_to_ebitda, None);
        assert_eq!(n.week52_high, None);
        assert_eq!(n.dividend_yield, None);
    }

    #[test]
    fn test_unknown_sector_placeholders_are_cleared() {
        let raw = RawFundamentals::new("any").with_sector(" N/A ");
        assert_eq!(normalize(&raw).fundamentals.sector, None);
        let raw = RawFundamentals::new("any").with_sector(" Energy ");
        assert_eq!(
            normalize(&raw).fundamentals.sector.as_deref(),
            Some("Energy")
        );
    }

    #[test]
    fn test_policy_from_partial_yaml() {
        let yaml = r#"
policy:
  per_share_ceiling: 5000.0
  pe_band: { min: 0.5, max: 80.0 }
sources:
  alphavantage:
    percent_yields: false
"#;
        let config: NormalizationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.policy.per_share_ceiling, 5000.0);
        assert_eq!(config.policy.pe_band, Band::new(0.5, 80.0));
        assert_eq!(config.policy.dividend_yield_ceiling, 0.5);
        let normalizer = DataNormalizer::from_config(&config);
        assert_eq!(
            normalizer.hints_for("alphavantage").percent_yields,
            Some(false)
        );
        assert_eq!(normalizer.hints_for("unknown"), SourceHints::default());
    }
}
