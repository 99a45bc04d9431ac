//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statpower_core::PowerResult;

/// Complete power-study report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerReport {
    /// Run metadata
    pub meta: ReportMeta,
    /// Every power result, in result-store order
    pub results: Vec<PowerResult>,
    /// Aggregates over `results`
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report schema version
    pub schema_version: u32,
    /// statpower version that produced the report
    pub version: String,
    /// Wall-clock time the report was built
    pub timestamp: DateTime<Utc>,
    /// Monte Carlo count used for critical-value calibration
    pub monte_carlo_count: usize,
}

impl ReportMeta {
    /// Metadata stamped with the current time and crate version
    pub fn now(monte_carlo_count: usize) -> Self {
        Self {
            schema_version: 1,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            monte_carlo_count,
        }
    }
}

/// Report summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total number of power results
    pub total_results: usize,
    /// Distinct test codes seen
    pub tests: Vec<String>,
    /// Distinct alternative generator codes seen
    pub alternatives: Vec<String>,
    /// Distinct sample sizes seen
    pub sizes: Vec<usize>,
    /// Mean power over all results
    pub mean_power: f64,
    /// Lowest observed power
    pub min_power: f64,
    /// Highest observed power
    pub max_power: f64,
}

impl ReportSummary {
    /// Aggregate a summary over a slice of results
    pub fn from_results(results: &[PowerResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }

        let mut tests: Vec<String> = results.iter().map(|r| r.test_code.clone()).collect();
        tests.sort();
        tests.dedup();

        let mut alternatives: Vec<String> =
            results.iter().map(|r| r.generator_code.clone()).collect();
        alternatives.sort();
        alternatives.dedup();

        let mut sizes: Vec<usize> = results.iter().map(|r| r.size).collect();
        sizes.sort_unstable();
        sizes.dedup();

        let mean_power = results.iter().map(|r| r.power).sum::<f64>() / results.len() as f64;
        let min_power = results.iter().map(|r| r.power).fold(f64::INFINITY, f64::min);
        let max_power = results
            .iter()
            .map(|r| r.power)
            .fold(f64::NEG_INFINITY, f64::max);

        Self {
            total_results: results.len(),
            tests,
            alternatives,
            sizes,
            mean_power,
            min_power,
            max_power,
        }
    }
}
