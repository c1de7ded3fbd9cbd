use serde::Serialize;
use std::fmt::Display;

/// Multiples-based target price methods, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleMethod {
    HistoricPe,
    SectorPe,
    HistoricPb,
    SectorPb,
    SectorEvToEbitda,
}

impl MultipleMethod {
    pub const ALL: [MultipleMethod; 5] = [
        MultipleMethod::HistoricPe,
        MultipleMethod::SectorPe,
        MultipleMethod::HistoricPb,
        MultipleMethod::SectorPb,
        MultipleMethod::SectorEvToEbitda,
    ];
}

impl Display for MultipleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MultipleMethod::HistoricPe => "Historic P/E",
                MultipleMethod::SectorPe => "Sector P/E",
                MultipleMethod::HistoricPb => "Historic P/B",
                MultipleMethod::SectorPb => "Sector P/B",
                MultipleMethod::SectorEvToEbitda => "Sector EV/EBITDA",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    Multiple(MultipleMethod),
    DividendDiscount,
    DiscountedCashFlow,
}

impl Display for ValuationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValuationMethod::Multiple(method) => write!(f, "{method}"),
            ValuationMethod::DividendDiscount => write!(f, "Gordon growth"),
            ValuationMethod::DiscountedCashFlow => write!(f, "Two-stage DCF"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationEstimate {
    pub method: ValuationMethod,
    pub target_price: f64,
    /// `(target / price - 1) * 100`.
    pub upside_percent: f64,
}

impl ValuationEstimate {
    /// `price` must be positive; callers check it before computing a target.
    pub fn new(method: ValuationMethod, target_price: f64, price: f64) -> Self {
        ValuationEstimate {
            method,
            target_price,
            upside_percent: (target_price / price - 1.0) * 100.0,
        }
    }
}
