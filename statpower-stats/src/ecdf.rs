//! Empirical CDF Quantiles
//!
//! Computes quantiles from sorted null-distribution samples using the
//! inverse empirical CDF (step function). No interpolation: the critical
//! value must be a statistic value that was actually observed under the
//! null hypothesis, so the quantile at probability `p` is the smallest
//! sample value whose cumulative probability reaches `p`.

use thiserror::Error;

/// Errors from quantile computation
#[derive(Debug, Error)]
pub enum EcdfError {
    /// The null-distribution sample contained no values
    #[error("Empty null-distribution sample")]
    EmptySample,

    /// Probability outside the open interval (0, 1)
    #[error("Invalid probability: {0} (must be strictly between 0 and 1)")]
    InvalidProbability(f64),

    /// Significance level outside the open interval (0, 1)
    #[error("Invalid significance level: {0} (must be strictly between 0 and 1)")]
    InvalidAlpha(f64),
}

/// Quantile of a sorted sample via the inverse empirical CDF.
///
/// For a sorted sample `v` of length `n`, returns `v[ceil(p * n) - 1]`
/// (clamped to the valid index range). Monotonically non-decreasing in `p`.
///
/// The caller guarantees `sorted` is in ascending order; this function does
/// not re-sort.
pub fn ecdf_quantile(sorted: &[f64], p: f64) -> Result<f64, EcdfError> {
    if sorted.is_empty() {
        return Err(EcdfError::EmptySample);
    }
    if !(p > 0.0 && p < 1.0) {
        return Err(EcdfError::InvalidProbability(p));
    }

    let n = sorted.len();
    let rank = (p * n as f64).ceil() as usize;
    let idx = rank.max(1).min(n) - 1;

    Ok(sorted[idx])
}

/// One-sided upper critical value at significance level `alpha`.
///
/// Rejection region: observed statistic strictly greater than the returned
/// value. Non-increasing as `alpha` grows.
pub fn one_sided_critical_value(sorted: &[f64], alpha: f64) -> Result<f64, EcdfError> {
    validate_alpha(alpha)?;
    ecdf_quantile(sorted, 1.0 - alpha)
}

/// Two-sided critical-value pair `(lower, upper)` at significance level `alpha`.
///
/// Rejection region: observed statistic below `lower` or above `upper`,
/// each tail carrying `alpha / 2` of the null distribution.
pub fn two_sided_critical_values(sorted: &[f64], alpha: f64) -> Result<(f64, f64), EcdfError> {
    validate_alpha(alpha)?;
    let lower = ecdf_quantile(sorted, alpha / 2.0)?;
    let upper = ecdf_quantile(sorted, 1.0 - alpha / 2.0)?;
    Ok((lower, upper))
}

fn validate_alpha(alpha: f64) -> Result<(), EcdfError> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(EcdfError::InvalidAlpha(alpha))
    }
}
