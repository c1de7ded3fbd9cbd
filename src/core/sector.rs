//! Per-sector average multiples used as relative valuation anchors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

fn default_ev_to_ebitda() -> f64 {
    6.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorBenchmark {
    pub pe: f64,
    pub pb: f64,
    pub roe: f64,
    #[serde(default = "default_ev_to_ebitda")]
    pub ev_to_ebitda: f64,
}

impl SectorBenchmark {
    pub const fn new(pe: f64, pb: f64, roe: f64, ev_to_ebitda: f64) -> Self {
        SectorBenchmark {
            pe,
            pb,
            roe,
            ev_to_ebitda,
        }
    }
}

/// Market-wide averages used for companies whose sector is unknown.
pub const MARKET_BENCHMARK: SectorBenchmark = SectorBenchmark::new(10.0, 1.2, 0.15, 6.0);

const BUILTIN_SECTORS: [(&str, SectorBenchmark); 11] = [
    ("Energy", SectorBenchmark::new(6.5, 1.1, 0.18, 4.0)),
    ("Basic Materials", SectorBenchmark::new(8.0, 1.4, 0.16, 5.0)),
    ("Financial Services", SectorBenchmark::new(8.5, 1.2, 0.15, 6.0)),
    ("Industrials", SectorBenchmark::new(16.0, 2.5, 0.14, 9.0)),
    ("Consumer Cyclical", SectorBenchmark::new(14.0, 1.8, 0.10, 7.5)),
    ("Consumer Defensive", SectorBenchmark::new(17.0, 2.2, 0.12, 9.5)),
    ("Utilities", SectorBenchmark::new(9.0, 1.3, 0.12, 6.5)),
    ("Technology", SectorBenchmark::new(22.0, 4.0, 0.18, 14.0)),
    ("Healthcare", SectorBenchmark::new(20.0, 3.0, 0.13, 12.0)),
    ("Communication Services", SectorBenchmark::new(13.0, 1.6, 0.11, 6.0)),
    ("Real Estate", SectorBenchmark::new(11.0, 0.9, 0.08, 10.0)),
];

/// A configured sector row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorEntry {
    pub name: String,
    pub pe: f64,
    pub pb: f64,
    pub roe: f64,
    #[serde(default = "default_ev_to_ebitda")]
    pub ev_to_ebitda: f64,
}

impl SectorEntry {
    pub fn benchmark(&self) -> SectorBenchmark {
        SectorBenchmark::new(self.pe, self.pb, self.roe, self.ev_to_ebitda)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorsConfig {
    /// Used when a company has no sector or an unlisted one. `None` disables
    /// sector-relative methods for such companies.
    #[serde(default)]
    pub fallback: Option<SectorBenchmark>,
    #[serde(default)]
    pub entries: Vec<SectorEntry>,
}

/// Immutable sector lookup. Names match case-insensitively.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorBenchmarkTable {
    entries: BTreeMap<String, (String, SectorBenchmark)>,
    fallback: Option<SectorBenchmark>,
}

static BUILTIN: LazyLock<SectorBenchmarkTable> = LazyLock::new(|| {
    SectorBenchmarkTable::new(
        BUILTIN_SECTORS
            .iter()
            .map(|(name, benchmark)| (name.to_string(), *benchmark)),
        Some(MARKET_BENCHMARK),
    )
});

impl SectorBenchmarkTable {
    pub fn new(
        entries: impl IntoIterator<Item = (String, SectorBenchmark)>,
        fallback: Option<SectorBenchmark>,
    ) -> Self {
        SectorBenchmarkTable {
            entries: entries
                .into_iter()
                .map(|(name, benchmark)| (name.trim().to_lowercase(), (name, benchmark)))
                .collect(),
            fallback,
        }
    }

    /// The shipped table, shared process-wide.
    pub fn builtin() -> &'static SectorBenchmarkTable {
        &BUILTIN
    }

    pub fn from_config(config: &SectorsConfig) -> Self {
        SectorBenchmarkTable::new(
            config
                .entries
                .iter()
                .map(|entry| (entry.name.clone(), entry.benchmark())),
            config.fallback,
        )
    }

    /// Exact (case-insensitive) sector match only.
    pub fn get(&self, sector: &str) -> Option<&SectorBenchmark> {
        self.entries
            .get(&sector.trim().to_lowercase())
            .map(|(_, benchmark)| benchmark)
    }

    /// Sector match, else the fallback benchmark.
    pub fn resolve(&self, sector: Option<&str>) -> Option<&SectorBenchmark> {
        sector
            .and_then(|s| self.get(s))
            .or(self.fallback.as_ref())
    }

    pub fn fallback(&self) -> Option<&SectorBenchmark> {
        self.fallback.as_ref()
    }

    /// Rows in name order, with their display names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SectorBenchmark)> {
        self.entries
            .values()
            .map(|(name, benchmark)| (name.as_str(), benchmark))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SectorBenchmarkTable {
    fn default() -> Self {
        SectorBenchmarkTable::builtin().clone()
    }
}
