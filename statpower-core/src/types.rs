//! Experiment Data Model

use serde::{Deserialize, Serialize};

/// Rejection threshold for a hypothesis test at a fixed significance level.
///
/// Derived from the empirical quantiles of a simulated null distribution,
/// or supplied analytically by the test itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CriticalValue {
    /// Upper threshold: reject when the statistic exceeds it
    OneSided(f64),
    /// Interval: reject when the statistic falls outside it
    TwoSided {
        /// Lower bound of the acceptance region
        lower: f64,
        /// Upper bound of the acceptance region
        upper: f64,
    },
}

impl CriticalValue {
    /// Whether an observed statistic rejects the null hypothesis.
    ///
    /// NaN statistics never reject: a mathematically undefined statistic is
    /// a domain outcome, not evidence against the null.
    pub fn rejects(&self, statistic: f64) -> bool {
        if statistic.is_nan() {
            return false;
        }
        match *self {
            CriticalValue::OneSided(upper) => statistic > upper,
            CriticalValue::TwoSided { lower, upper } => statistic < lower || statistic > upper,
        }
    }
}

/// Terminal artifact of the testing stage: the empirical rejection rate of
/// one test against one alternative at one (size, alpha).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerResult {
    /// Test statistic code
    pub test_code: String,
    /// Alternative generator code the samples were drawn from
    pub generator_code: String,
    /// Sample size
    pub size: usize,
    /// Significance level
    pub alpha: f64,
    /// Fraction of samples whose statistic rejected the null, in [0, 1]
    pub power: f64,
}

/// Stable result-store key for a power result tuple.
pub fn result_key(test_code: &str, generator_code: &str, size: usize, alpha: f64) -> String {
    format!("{}:{}:{}:{}", test_code, generator_code, size, alpha)
}
