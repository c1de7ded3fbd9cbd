//! Fair value across a grid of growth and discount rate pairs.

use crate::core::dcf::{DcfAssumptions, DcfValuator};
use crate::core::dividend::DividendDiscountValuator;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A model whose value depends on a growth rate and a discount rate.
pub trait RateSensitive {
    fn value_at(&self, growth_rate: f64, discount_rate: f64) -> Option<f64>;
}

impl RateSensitive for DividendDiscountValuator<'_> {
    fn value_at(&self, growth_rate: f64, discount_rate: f64) -> Option<f64> {
        self.fair_value(growth_rate, discount_rate)
    }
}

/// Varies perpetuity growth and WACC of a base set of DCF assumptions,
/// reporting value per share.
pub struct DcfSensitivity {
    base: DcfAssumptions,
}

impl DcfSensitivity {
    pub fn new(base: DcfAssumptions) -> Self {
        DcfSensitivity { base }
    }
}

impl RateSensitive for DcfSensitivity {
    fn value_at(&self, growth_rate: f64, discount_rate: f64) -> Option<f64> {
        let assumptions = DcfAssumptions {
            stage2_growth_rate: growth_rate,
            discount_rate,
            ..self.base
        };
        DcfValuator
            .value(&assumptions)
            .ok()
            .map(|result| result.value_per_share)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridCell {
    /// Discount rate at or below growth rate; the model is undefined there.
    OutOfDomain,
    NoEstimate,
    Value(f64),
}

impl GridCell {
    pub fn value(&self) -> Option<f64> {
        match self {
            GridCell::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Rows follow `growth_rates`, columns follow `discount_rates`.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityMatrix {
    pub growth_rates: Vec<f64>,
    pub discount_rates: Vec<f64>,
    pub cells: Vec<Vec<GridCell>>,
}

impl SensitivityMatrix {
    pub fn get(&self, row: usize, column: usize) -> Option<GridCell> {
        self.cells.get(row).and_then(|r| r.get(column)).copied()
    }
}

/// Grid geometry: `steps_per_side` points either side of each center,
/// `step` apart. Defaults to +/- 2 percentage points in 1 point steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityGrid {
    pub step: f64,
    pub steps_per_side: u32,
}

impl Default for SensitivityGrid {
    fn default() -> Self {
        SensitivityGrid {
            step: 0.01,
            steps_per_side: 2,
        }
    }
}

impl SensitivityGrid {
    pub fn axis(&self, center: f64) -> Vec<f64> {
        let n = self.steps_per_side as i64;
        (-n..=n)
            .map(|k| round_rate(center + k as f64 * self.step))
            .collect()
    }

    pub fn evaluate(
        &self,
        model: &dyn RateSensitive,
        growth_center: f64,
        discount_center: f64,
    ) -> SensitivityMatrix {
        let growth_rates = self.axis(growth_center);
        let discount_rates = self.axis(discount_center);
        let cells = growth_rates
            .iter()
            .map(|&growth| {
                discount_rates
                    .iter()
                    .map(|&discount| {
                        if discount <= growth {
                            GridCell::OutOfDomain
                        } else {
                            model
                                .value_at(growth, discount)
                                .map_or(GridCell::NoEstimate, GridCell::Value)
                        }
                    })
                    .collect()
            })
            .collect();
        debug!(
            rows = growth_rates.len(),
            columns = discount_rates.len(),
            "Evaluated sensitivity grid"
        );
        SensitivityMatrix {
            growth_rates,
            discount_rates,
            cells,
        }
    }
}

/// Removes accumulated float noise so grid points compare exactly.
fn round_rate(rate: f64) -> f64 {
    (rate * 1e8).round() / 1e8
}
