//! Power Calculation Worker
//!
//! Evaluates one (test, alternative, size, alpha) combination: resolves the
//! critical value through the calculator, applies the test statistic to every
//! persisted alternative sample, and reduces to the rejection rate. The
//! worker holds no hypothesis state; everything it needs arrives per call.

use crate::executor::calculator::{CalculatorError, CriticalValueCalculator};
use statpower_core::{GofTest, PowerResult, RvsGenerator};
use thiserror::Error;
use tracing::debug;

/// Errors from a single power evaluation
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Power over zero samples is undefined, not zero
    #[error("No samples for '{generator_code}' at size {size}: power is undefined")]
    EmptySamples {
        /// Alternative generator the samples were expected under
        generator_code: String,
        /// Sample size requested
        size: usize,
    },

    /// Critical-value resolution failed
    #[error(transparent)]
    Calculator(#[from] CalculatorError),
}

/// Stateless power evaluator; the Monte Carlo budget is its only setting
pub struct PowerCalculationWorker {
    monte_carlo_count: usize,
}

impl PowerCalculationWorker {
    /// Worker whose calibrations run `monte_carlo_count` repetitions
    pub fn new(monte_carlo_count: usize) -> Self {
        Self { monte_carlo_count }
    }

    /// Estimate the power of `test` against the alternative that produced
    /// `samples`, at `size` and `alpha`.
    ///
    /// A NaN statistic counts as a non-rejection: an undefined statistic is a
    /// domain outcome of the sample, not a failure of the run.
    pub fn execute(
        &self,
        test: &dyn GofTest,
        null_generator: &dyn RvsGenerator,
        calculator: &CriticalValueCalculator,
        samples: &[Vec<f64>],
        alternative_code: &str,
        size: usize,
        alpha: f64,
    ) -> Result<PowerResult, WorkerError> {
        if samples.is_empty() {
            return Err(WorkerError::EmptySamples {
                generator_code: alternative_code.to_string(),
                size,
            });
        }

        let critical_value =
            calculator.get_or_calculate(test, null_generator, size, alpha, self.monte_carlo_count)?;

        let mut rejections = 0usize;
        for sample in samples {
            let statistic = test.execute_statistic(sample);
            if critical_value.rejects(statistic) {
                rejections += 1;
            }
        }
        let power = rejections as f64 / samples.len() as f64;

        debug!(
            test = %test.code(),
            alternative = %alternative_code,
            size,
            alpha,
            samples = samples.len(),
            rejections,
            power,
            "power evaluated"
        );

        Ok(PowerResult {
            test_code: test.code(),
            generator_code: alternative_code.to_string(),
            size,
            alpha,
            power,
        })
    }
}
