//! Valuation engine: normalization, valuation models and their inputs.
//!
//! Everything here except `cache`, `config`, `log` and `provider` is pure and
//! synchronous; values are created per request and never shared mutably.

pub mod band;
pub mod cache;
pub mod config;
pub mod dcf;
pub mod dividend;
pub mod error;
pub mod estimate;
pub mod fundamentals;
pub mod log;
pub mod multiples;
pub mod normalize;
pub mod provider;
pub mod sector;
pub mod sensitivity;

// Re-export main types for cleaner imports
pub use dcf::{DcfAssumptions, DcfInputs, DcfResult, DcfValuator};
pub use dividend::DividendDiscountValuator;
pub use error::ValuationError;
pub use estimate::{MultipleMethod, ValuationEstimate, ValuationMethod};
pub use fundamentals::{Field, NormalizedFundamentals, PriceHistory, RawFundamentals};
pub use multiples::MultiplesValuator;
pub use normalize::{DataNormalizer, NormalizationReport};
pub use provider::{FundamentalsProvider, PriceHistoryProvider};
pub use sector::{SectorBenchmark, SectorBenchmarkTable};
pub use sensitivity::{RateSensitive, SensitivityGrid, SensitivityMatrix};
