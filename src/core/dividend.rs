//! Gordon growth model on the normalized dividend yield.

use crate::core::band::Band;
use crate::core::error::{Result, check_band, require, require_greater};
use crate::core::estimate::{ValuationEstimate, ValuationMethod};
use crate::core::fundamentals::NormalizedFundamentals;
use tracing::debug;

/// Yields above this are treated as data errors.
pub const DIVIDEND_YIELD_CEILING: f64 = 0.5;

/// Fair values outside `[0.1, 10] x price` are discarded.
pub const FAIR_VALUE_PRICE_MULTIPLE: Band = Band::new(0.1, 10.0);

pub struct DividendDiscountValuator<'a> {
    fundamentals: &'a NormalizedFundamentals,
}

impl<'a> DividendDiscountValuator<'a> {
    pub fn new(fundamentals: &'a NormalizedFundamentals) -> Self {
        DividendDiscountValuator { fundamentals }
    }

    /// `price * yield / (required_return - growth_rate)`, or `None` when the
    /// inputs or the result are not usable.
    pub fn fair_value(&self, growth_rate: f64, required_return: f64) -> Option<f64> {
        self.try_fair_value(growth_rate, required_return).ok()
    }

    pub fn try_fair_value(&self, growth_rate: f64, required_return: f64) -> Result<f64> {
        let price = check_band(
            "price",
            require("price", self.fundamentals.price)?,
            Band::positive(),
        )?;
        let dividend_yield = check_band(
            "dividend_yield",
            require("dividend_yield", self.fundamentals.dividend_yield)?,
            Band::new(f64::MIN_POSITIVE, DIVIDEND_YIELD_CEILING),
        )?;
        check_band("growth_rate", growth_rate, Band::new(-1.0, 1.0))?;
        check_band("required_return", required_return, Band::new(-1.0, 1.0))?;
        require_greater(
            "required_return",
            required_return,
            "growth_rate",
            growth_rate,
        )?;

        let annual_dividend = price * dividend_yield;
        let fair_value = annual_dividend / (required_return - growth_rate);
        debug!(
            annual_dividend,
            growth_rate, required_return, fair_value, "Gordon growth fair value"
        );
        check_band(
            "fair_value",
            fair_value,
            FAIR_VALUE_PRICE_MULTIPLE.scaled(price),
        )
    }

    pub fn estimate(&self, growth_rate: f64, required_return: f64) -> Option<ValuationEstimate> {
        let fair_value = self.fair_value(growth_rate, required_return)?;
        let price = self.fundamentals.price?;
        Some(ValuationEstimate::new(
            ValuationMethod::DividendDiscount,
            fair_value,
            price,
        ))
    }
}
