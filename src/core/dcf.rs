//! Two-stage discounted cash flow on free cash flow to the firm.
//!
//! Stage one grows FCFF at an explicit rate for a fixed number of years; the
//! terminal value capitalizes the following year's FCFF at `WACC - g`. Both
//! are discounted at WACC and bridged from enterprise to equity value.

use crate::core::band::Band;
use crate::core::error::{Result, ValuationError, check_band, require_greater};
use crate::core::estimate::{ValuationEstimate, ValuationMethod};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const STAGE1_YEARS: Band = Band::new(1.0, 15.0);
/// Accepted range for rates given in percent.
pub const RATE_PERCENT: Band = Band::new(-100.0, 100.0);

/// Assumptions as users type them: rates in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfInputs {
    pub initial_fcff: f64,
    pub stage1_growth_pct: f64,
    pub stage1_years: u32,
    pub stage2_growth_pct: f64,
    pub wacc_pct: f64,
    pub shares_outstanding: f64,
    #[serde(default)]
    pub net_debt: f64,
    #[serde(default)]
    pub cash_and_equivalents: f64,
}

impl DcfInputs {
    pub fn to_assumptions(&self) -> Result<DcfAssumptions> {
        let rate = |field, pct: f64| check_band(field, pct, RATE_PERCENT).map(|p| p / 100.0);
        let assumptions = DcfAssumptions {
            initial_fcff: self.initial_fcff,
            stage1_growth_rate: rate("stage1_growth_pct", self.stage1_growth_pct)?,
            stage1_years: self.stage1_years,
            stage2_growth_rate: rate("stage2_growth_pct", self.stage2_growth_pct)?,
            discount_rate: rate("wacc_pct", self.wacc_pct)?,
            shares_outstanding: self.shares_outstanding,
            net_debt: self.net_debt,
            cash_and_equivalents: self.cash_and_equivalents,
        };
        assumptions.validate()?;
        Ok(assumptions)
    }
}

/// Rates are fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    pub initial_fcff: f64,
    pub stage1_growth_rate: f64,
    pub stage1_years: u32,
    /// Perpetuity growth after stage one.
    pub stage2_growth_rate: f64,
    /// WACC.
    pub discount_rate: f64,
    pub shares_outstanding: f64,
    pub net_debt: f64,
    pub cash_and_equivalents: f64,
}

impl DcfAssumptions {
    /// Checks every precondition so a computation never stops half way.
    pub fn validate(&self) -> Result<()> {
        let finite = Band::new(f64::MIN, f64::MAX);
        check_band("initial_fcff", self.initial_fcff, finite)?;
        check_band("net_debt", self.net_debt, finite)?;
        check_band("cash_and_equivalents", self.cash_and_equivalents, finite)?;
        check_band("stage1_years", self.stage1_years as f64, STAGE1_YEARS)?;
        check_band("stage1_growth_rate", self.stage1_growth_rate, Band::new(-1.0, 1.0))?;
        check_band("stage2_growth_rate", self.stage2_growth_rate, Band::new(-1.0, 1.0))?;
        check_band("discount_rate", self.discount_rate, Band::new(-1.0, 1.0))?;
        require_greater(
            "discount_rate",
            self.discount_rate,
            "stage2_growth_rate",
            self.stage2_growth_rate,
        )?;
        if !self.shares_outstanding.is_finite() || self.shares_outstanding <= 0.0 {
            return Err(ValuationError::ArithmeticError {
                field: "shares_outstanding",
                value: self.shares_outstanding,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub year: u32,
    pub fcff: f64,
    pub present_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DcfResult {
    /// Stage-one years in order.
    pub schedule: Vec<ScheduleEntry>,
    pub terminal_value: f64,
    pub present_value_of_terminal: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub value_per_share: f64,
}

impl DcfResult {
    pub fn present_value_of_stage1(&self) -> f64 {
        self.schedule.iter().map(|entry| entry.present_value).sum()
    }

    /// Share of enterprise value coming from the terminal value.
    pub fn terminal_weight(&self) -> Option<f64> {
        (self.enterprise_value != 0.0)
            .then(|| self.present_value_of_terminal / self.enterprise_value)
    }

    pub fn estimate(&self, price: Option<f64>) -> Option<ValuationEstimate> {
        let price = price.filter(|p| Band::positive().contains(*p))?;
        Some(ValuationEstimate::new(
            ValuationMethod::DiscountedCashFlow,
            self.value_per_share,
            price,
        ))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DcfValuator;

impl DcfValuator {
    pub fn value(&self, assumptions: &DcfAssumptions) -> Result<DcfResult> {
        assumptions.validate()?;

        let wacc = assumptions.discount_rate;
        let mut schedule = Vec::with_capacity(assumptions.stage1_years as usize);
        let mut fcff = assumptions.initial_fcff;
        for year in 1..=assumptions.stage1_years {
            fcff *= 1.0 + assumptions.stage1_growth_rate;
            let present_value = fcff / (1.0 + wacc).powi(year as i32);
            schedule.push(ScheduleEntry {
                year,
                fcff,
                present_value,
            });
        }

        let terminal_fcff = fcff * (1.0 + assumptions.stage2_growth_rate);
        let terminal_value = terminal_fcff / (wacc - assumptions.stage2_growth_rate);
        let present_value_of_terminal =
            terminal_value / (1.0 + wacc).powi(assumptions.stage1_years as i32);

        let stage1: f64 = schedule.iter().map(|entry| entry.present_value).sum();
        let enterprise_value = stage1 + present_value_of_terminal;
        let equity_value =
            enterprise_value - assumptions.net_debt + assumptions.cash_and_equivalents;
        let value_per_share = equity_value / assumptions.shares_outstanding;

        debug!(
            terminal_value,
            enterprise_value, equity_value, value_per_share, "DCF valued"
        );
        Ok(DcfResult {
            schedule,
            terminal_value,
            present_value_of_terminal,
            enterprise_value,
            equity_value,
            value_per_share,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DcfAssumptions {
        DcfAssumptions {
            initial_fcff: 1000.0,
            stage1_growth_rate: 0.15,
            stage1_years: 5,
            stage2_growth_rate: 0.03,
            discount_rate: 0.10,
            shares_outstanding: 1000.0,
            net_debt: 0.0,
            cash_and_equivalents: 0.0,
        }
    }

    fn relative_error(actual: f64, expected: f64) -> f64 {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn test_reference_schedule() {
        let result = DcfValuator.value(&base()).unwrap();

        assert_eq!(result.schedule.len(), 5);
        let years: Vec<u32> = result.schedule.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![1, 2, 3, 4, 5]);

        let year5 = result.schedule[4];
        assert!(relative_error(year5.fcff, 2011.36) < 1e-5);
        assert!(relative_error(result.terminal_value, 29595.9) < 1e-3);

        let discounted: f64 = (1..=5)
            .map(|t| 1000.0 * 1.15_f64.powi(t) / 1.1_f64.powi(t))
            .sum();
        assert!(relative_error(result.present_value_of_stage1(), discounted) < 1e-9);
        assert!(relative_error(result.present_value_of_terminal, 29595.9 / 1.1_f64.powi(5)) < 1e-3);
        assert!(relative_error(result.value_per_share, result.enterprise_value / 1000.0) < 1e-12);
    }

    #[test]
    fn test_enterprise_value_is_sum_of_parts() {
        for (growth, years, wacc, g2) in [
            (0.15, 5, 0.10, 0.03),
            (-0.05, 1, 0.08, 0.0),
            (0.30, 15, 0.14, 0.05),
            (0.02, 10, 0.06, -0.01),
        ] {
            let assumptions = DcfAssumptions {
                stage1_growth_rate: growth,
                stage1_years: years,
                discount_rate: wacc,
                stage2_growth_rate: g2,
                ..base()
            };
            let result = DcfValuator.value(&assumptions).unwrap();
            let expected = result.present_value_of_stage1() + result.present_value_of_terminal;
            assert!(relative_error(result.enterprise_value, expected) < 1e-6);
            assert_eq!(result.schedule.len(), years as usize);
        }
    }

    #[test]
    fn test_equity_bridge_and_per_share_scaling() {
        let assumptions = DcfAssumptions {
            net_debt: 4000.0,
            cash_and_equivalents: 1500.0,
            ..base()
        };
        let result = DcfValuator.value(&assumptions).unwrap();
        assert!(
            (result.equity_value - (result.enterprise_value - 4000.0 + 1500.0)).abs() < 1e-6
        );

        let doubled = DcfValuator
            .value(&DcfAssumptions {
                shares_outstanding: 2000.0,
                ..assumptions
            })
            .unwrap();
        assert!(relative_error(doubled.value_per_share, result.value_per_share / 2.0) < 1e-12);
    }

    #[test]
    fn test_wacc_not_above_perpetuity_growth_is_rejected() {
        for (wacc, g2) in [(0.03, 0.03), (0.02, 0.05), (-0.01, 0.0)] {
            let assumptions = DcfAssumptions {
                discount_rate: wacc,
                stage2_growth_rate: g2,
                ..base()
            };
            assert!(matches!(
                DcfValuator.value(&assumptions),
                Err(ValuationError::ConstraintViolation {
                    upper: "discount_rate",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_non_positive_shares_is_arithmetic_error() {
        for shares in [0.0, -10.0] {
            let assumptions = DcfAssumptions {
                shares_outstanding: shares,
                ..base()
            };
            assert_eq!(
                DcfValuator.value(&assumptions),
                Err(ValuationError::ArithmeticError {
                    field: "shares_outstanding",
                    value: shares,
                })
            );
        }
    }

    #[test]
    fn test_stage1_years_range() {
        for years in [0, 16] {
            let assumptions = DcfAssumptions {
                stage1_years: years,
                ..base()
            };
            assert!(matches!(
                DcfValuator.value(&assumptions),
                Err(ValuationError::ImplausibleData {
                    field: "stage1_years",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_percent_inputs_are_converted() {
        let inputs = DcfInputs {
            initial_fcff: 1000.0,
            stage1_growth_pct: 15.0,
            stage1_years: 5,
            stage2_growth_pct: 3.0,
            wacc_pct: 10.0,
            shares_outstanding: 1000.0,
            net_debt: 0.0,
            cash_and_equivalents: 0.0,
        };
        let assumptions = inputs.to_assumptions().unwrap();
        assert!((assumptions.stage1_growth_rate - 0.15).abs() < 1e-12);
        assert!((assumptions.stage2_growth_rate - 0.03).abs() < 1e-12);
        assert!((assumptions.discount_rate - 0.10).abs() < 1e-12);

        let bad = DcfInputs {
            wacc_pct: 250.0,
            ..inputs
        };
        assert!(matches!(
            bad.to_assumptions(),
            Err(ValuationError::ImplausibleData {
                field: "wacc_pct",
                ..
            })
        ));
    }

    #[test]
    fn test_inputs_from_yaml_default_bridge_to_zero() {
        let yaml = r#"
initial_fcff: 52000.0
stage1_growth_pct: 8
stage1_years: 5
stage2_growth_pct: 3
wacc_pct: 12
shares_outstanding: 13044
"#;
        let inputs: DcfInputs = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(inputs.net_debt, 0.0);
        assert_eq!(inputs.cash_and_equivalents, 0.0);
        assert!(inputs.to_assumptions().is_ok());
    }

    #[test]
    fn test_estimate_needs_price() {
        let result = DcfValuator.value(&base()).unwrap();
        assert!(result.estimate(None).is_none());
        assert!(result.estimate(Some(0.0)).is_none());
        let estimate = result.estimate(Some(20.0)).unwrap();
        assert_eq!(estimate.method, ValuationMethod::DiscountedCashFlow);
        assert!(estimate.upside_percent > 0.0);
        let weight = result.terminal_weight().unwrap();
        assert!(weight > 0.5 && weight < 1.0);
    }
}
