//! Monte Carlo Critical-Value Calculator
//!
//! Resolves the rejection threshold for a (test, size, alpha) combination,
//! cheapest source first:
//!
//! 1. Analytic shortcut exposed by the test itself
//! 2. In-process cache (exact alpha match, keyed by bit pattern)
//! 3. Persisted critical value in the store
//! 4. Persisted null distribution in the store (derive, then backfill)
//! 5. Fresh Monte Carlo simulation (persist distribution and value)
//!
//! Concurrent first-time calibration of the same key may simulate twice;
//! both writers upsert identical-quality values, so last-writer-wins is
//! accepted rather than coordinated away.

use statpower_core::{CriticalValue, GofTest, RvsGenerator};
use statpower_stats::{
    EcdfError, RELIABLE_MONTE_CARLO_COUNT, one_sided_critical_value, two_sided_critical_values,
};
use statpower_store::{CriticalValueStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from critical-value resolution
#[derive(Debug, Error)]
pub enum CalculatorError {
    /// Sample size must be at least one
    #[error("Invalid sample size: must be at least 1")]
    ZeroSize,

    /// Alpha must lie strictly inside the unit interval
    #[error("Invalid significance level {0}: must be in (0, 1)")]
    InvalidAlpha(f64),

    /// Monte Carlo repetition count must be at least one
    #[error("Invalid Monte Carlo count: must be at least 1")]
    ZeroMonteCarlo,

    /// Every simulated statistic was NaN
    #[error("Null distribution for '{test_code}' at size {size} is entirely undefined (NaN)")]
    DegenerateNullDistribution {
        /// Test whose statistic never produced a finite value
        test_code: String,
        /// Sample size being calibrated
        size: usize,
    },

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Quantile derivation failure
    #[error(transparent)]
    Quantile(#[from] EcdfError),
}

type CacheKey = (String, usize, u64);

/// Calculator with a shared store and an in-process exact-match cache
pub struct CriticalValueCalculator {
    store: Arc<dyn CriticalValueStore>,
    cache: Mutex<HashMap<CacheKey, CriticalValue>>,
}

impl CriticalValueCalculator {
    /// Calculator over `store`; the cache starts cold
    pub fn new(store: Arc<dyn CriticalValueStore>) -> Self {
        Self {
            store,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the critical value for `test` at `size` and `alpha`, running a
    /// `monte_carlo_count`-repetition simulation under `null_generator` only
    /// when no cheaper source has it.
    pub fn get_or_calculate(
        &self,
        test: &dyn GofTest,
        null_generator: &dyn RvsGenerator,
        size: usize,
        alpha: f64,
        monte_carlo_count: usize,
    ) -> Result<CriticalValue, CalculatorError> {
        if size == 0 {
            return Err(CalculatorError::ZeroSize);
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(CalculatorError::InvalidAlpha(alpha));
        }
        if monte_carlo_count == 0 {
            return Err(CalculatorError::ZeroMonteCarlo);
        }
        if monte_carlo_count < RELIABLE_MONTE_CARLO_COUNT {
            warn!(
                monte_carlo_count,
                minimum = RELIABLE_MONTE_CARLO_COUNT,
                "Monte Carlo count below the reliability floor; tail quantiles will be coarse"
            );
        }

        let test_code = test.code();

        if let Some(value) = test.calculate_critical_value(size, alpha) {
            debug!(test = %test_code, size, alpha, "critical value resolved analytically");
            return Ok(value);
        }

        let key = (test_code.clone(), size, alpha.to_bits());
        if let Some(value) = self.cache_get(&key)? {
            return Ok(value);
        }

        if let Some(value) = self.store.get_critical_value(&test_code, size, alpha)? {
            debug!(test = %test_code, size, alpha, "critical value resolved from store");
            self.cache_put(key, value)?;
            return Ok(value);
        }

        if let Some(distribution) = self.store.get_distribution(&test_code, size)? {
            debug!(test = %test_code, size, alpha, "critical value derived from stored distribution");
            let value = derive(test.two_tailed(), &distribution, alpha)?;
            self.store
                .insert_critical_value(&test_code, size, alpha, value)?;
            self.cache_put(key, value)?;
            return Ok(value);
        }

        debug!(
            test = %test_code,
            size,
            alpha,
            monte_carlo_count,
            null = %null_generator.code(),
            "simulating null distribution"
        );
        let distribution =
            simulate_null_distribution(test, null_generator, size, monte_carlo_count)?;
        let value = derive(test.two_tailed(), &distribution, alpha)?;
        self.store
            .insert_distribution(&test_code, size, distribution)?;
        self.store
            .insert_critical_value(&test_code, size, alpha, value)?;
        self.cache_put(key, value)?;
        Ok(value)
    }

    fn cache_get(&self, key: &CacheKey) -> Result<Option<CriticalValue>, CalculatorError> {
        let guard = self.cache.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.get(key).copied())
    }

    fn cache_put(&self, key: CacheKey, value: CriticalValue) -> Result<(), CalculatorError> {
        let mut guard = self.cache.lock().map_err(|_| StoreError::Poisoned)?;
        guard.insert(key, value);
        Ok(())
    }
}

/// Simulate the null distribution of the test statistic: `monte_carlo_count`
/// statistics over fresh null samples of `size`, sorted ascending.
///
/// NaN statistics (degenerate null draws) are dropped; they carry no
/// positional information for a quantile.
fn simulate_null_distribution(
    test: &dyn GofTest,
    null_generator: &dyn RvsGenerator,
    size: usize,
    monte_carlo_count: usize,
) -> Result<Vec<f64>, CalculatorError> {
    let mut statistics = Vec::with_capacity(monte_carlo_count);
    for _ in 0..monte_carlo_count {
        let sample = null_generator.generate(size);
        let statistic = test.execute_statistic(&sample);
        if statistic.is_nan() {
            continue;
        }
        statistics.push(statistic);
    }
    if statistics.is_empty() {
        return Err(CalculatorError::DegenerateNullDistribution {
            test_code: test.code(),
            size,
        });
    }
    statistics.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(statistics)
}

fn derive(two_tailed: bool, sorted: &[f64], alpha: f64) -> Result<CriticalValue, EcdfError> {
    if two_tailed {
        let (lower, upper) = two_sided_critical_values(sorted, alpha)?;
        Ok(CriticalValue::TwoSided { lower, upper })
    } else {
        Ok(CriticalValue::OneSided(one_sided_critical_value(
            sorted, alpha,
        )?))
    }
}
