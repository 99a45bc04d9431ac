#![warn(missing_docs)]
//! Statpower Statistical Engine
//!
//! Provides the quantile machinery behind Monte Carlo critical values:
//! - Inverse empirical CDF (step function) quantile estimation
//! - One-sided and two-sided critical-value derivation from sorted
//!   null-distribution samples

mod ecdf;

pub use ecdf::{
    EcdfError, ecdf_quantile, one_sided_critical_value, two_sided_critical_values,
};

/// Smallest Monte Carlo count that gives usable quantile resolution
pub const RELIABLE_MONTE_CARLO_COUNT: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(RELIABLE_MONTE_CARLO_COUNT, 100);
    }
}
