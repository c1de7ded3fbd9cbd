//! Target prices from P/E, P/B and EV/EBITDA multiples.

use crate::core::band::Band;
use crate::core::error::{Result, ValuationError, check_band, require};
use crate::core::estimate::{MultipleMethod, ValuationEstimate, ValuationMethod};
use crate::core::fundamentals::NormalizedFundamentals;
use crate::core::sector::{SectorBenchmark, SectorBenchmarkTable};
use tracing::debug;

/// Mean-reversion haircut applied to the company's own current P/E.
pub const HISTORIC_PE_DISCOUNT: f64 = 0.9;
/// Mean-reversion haircut applied to the company's own current P/B.
pub const HISTORIC_PB_DISCOUNT: f64 = 0.95;

pub const PE_FILTER: Band = Band::new(1.0, 50.0);
pub const PB_FILTER: Band = Band::new(0.1, 10.0);
pub const EV_TO_EBITDA_FILTER: Band = Band::new(1.0, 20.0);

/// Result slot for one method: either an estimate or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodOutcome {
    pub method: MultipleMethod,
    pub outcome: Result<ValuationEstimate>,
}

impl MethodOutcome {
    pub fn estimate(&self) -> Option<&ValuationEstimate> {
        self.outcome.as_ref().ok()
    }
}

pub struct MultiplesValuator<'a> {
    fundamentals: &'a NormalizedFundamentals,
    sectors: &'a SectorBenchmarkTable,
}

impl<'a> MultiplesValuator<'a> {
    pub fn new(
        fundamentals: &'a NormalizedFundamentals,
        sectors: &'a SectorBenchmarkTable,
    ) -> Self {
        MultiplesValuator {
            fundamentals,
            sectors,
        }
    }

    pub fn estimate(&self, method: MultipleMethod) -> Option<ValuationEstimate> {
        self.try_estimate(method).ok()
    }

    /// Every method in display order, each evaluated independently.
    pub fn evaluate(&self) -> Vec<MethodOutcome> {
        MultipleMethod::ALL
            .into_iter()
            .map(|method| MethodOutcome {
                method,
                outcome: self.try_estimate(method),
            })
            .collect()
    }

    pub fn try_estimate(&self, method: MultipleMethod) -> Result<ValuationEstimate> {
        let f = self.fundamentals;
        let price = check_band("price", require("price", f.price)?, Band::positive())?;

        let target = match method {
            MultipleMethod::HistoricPe => {
                let eps = positive("eps", f.eps)?;
                let pe = require("pe_ratio", f.pe_ratio)? * HISTORIC_PE_DISCOUNT;
                eps * check_band("historic_pe", pe, PE_FILTER)?
            }
            MultipleMethod::SectorPe => {
                let eps = positive("eps", f.eps)?;
                let pe = check_band("sector_pe", self.benchmark()?.pe, PE_FILTER)?;
                eps * pe
            }
            MultipleMethod::HistoricPb => {
                let book = positive("book_value_per_share", f.book_value_per_share)?;
                let pb = require("pb_ratio", f.pb_ratio)? * HISTORIC_PB_DISCOUNT;
                book * check_band("historic_pb", pb, PB_FILTER)?
            }
            MultipleMethod::SectorPb => {
                let book = positive("book_value_per_share", f.book_value_per_share)?;
                let pb = check_band("sector_pb", self.benchmark()?.pb, PB_FILTER)?;
                book * pb
            }
            MultipleMethod::SectorEvToEbitda => {
                let current = check_band(
                    "ev_to_ebitda",
                    require("ev_to_ebitda", f.ev_to_ebitda)?,
                    EV_TO_EBITDA_FILTER,
                )?;
                let sector = check_band(
                    "sector_ev_to_ebitda",
                    self.benchmark()?.ev_to_ebitda,
                    Band::positive(),
                )?;
                price * (sector / current)
            }
        };

        debug!(%method, target, "Computed multiples target");
        Ok(ValuationEstimate::new(
            ValuationMethod::Multiple(method),
            target,
            price,
        ))
    }

    fn benchmark(&self) -> Result<&'a SectorBenchmark> {
        self.sectors
            .resolve(self.fundamentals.sector.as_deref())
            .ok_or(ValuationError::MissingData {
                field: "sector_benchmark",
            })
    }
}

/// A target from a negative base would be meaningless, so those are rejected.
fn positive(field: &'static str, value: Option<f64>) -> Result<f64> {
    check_band(field, require(field, value)?, Band::positive())
}
