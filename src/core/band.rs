//! Closed plausibility ranges for numeric fields.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// An inclusive `[min, max]` range a value must fall within to be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Band { min, max }
    }

    /// Any strictly positive finite value.
    pub const fn positive() -> Self {
        Band::new(f64::MIN_POSITIVE, f64::MAX)
    }

    /// NaN and infinities are never contained.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Band::new(self.min * factor, self.max * factor)
    }
}

impl Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Band::positive() {
            write!(f, "(0, +inf)")
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}
