//! Random-Variate Generators
//!
//! A generator is the data source for one distribution family with fixed
//! parameters. Its code is the persistence key for every sample it produces:
//! two generators with equal codes are the same source. Parameters are
//! validated at construction, so a generator that exists always draws from
//! the distribution its code names.

use rand::Rng;
use rand::distributions::Distribution;
use rand_distr::{Cauchy, Exp, Normal, Weibull};
use thiserror::Error;

/// Errors from generator construction
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Parameters outside the distribution family's domain
    #[error("Invalid {family} parameters: {reason}")]
    InvalidParams {
        /// Distribution family name
        family: &'static str,
        /// What the parameters violated
        reason: &'static str,
    },
}

impl GeneratorError {
    fn invalid(family: &'static str, reason: &'static str) -> Self {
        Self::InvalidParams { family, reason }
    }
}

/// Random-variate source capability.
///
/// Implementations draw from `rand::thread_rng`; determinism across runs is
/// not part of the contract (samples are persisted, not regenerated).
pub trait RvsGenerator: Send + Sync {
    /// Stable code identifying this distribution family and its parameters
    fn code(&self) -> String;

    /// Draw one sample of `size` independent variates
    fn generate(&self, size: usize) -> Vec<f64>;
}

/// Build a generator code from a family name and its numeric parameters.
///
/// Integral parameters render without a fractional part so that
/// `normal_0_1` stays stable regardless of how the config spelled `1.0`.
pub fn variate_code(family: &str, params: &[f64]) -> String {
    let mut code = String::from(family);
    for p in params {
        code.push('_');
        if p.fract() == 0.0 && p.abs() < 1e15 {
            code.push_str(&format!("{}", *p as i64));
        } else {
            code.push_str(&format!("{}", p));
        }
    }
    code
}

/// Normal (Gaussian) variates
pub struct NormalGenerator {
    mean: f64,
    std_dev: f64,
    dist: Normal<f64>,
}

impl NormalGenerator {
    /// Create a generator; `mean` must be finite and `std_dev` positive
    /// and finite.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self, GeneratorError> {
        if !mean.is_finite() {
            return Err(GeneratorError::invalid("normal", "mean must be finite"));
        }
        if !std_dev.is_finite() || std_dev <= 0.0 {
            return Err(GeneratorError::invalid(
                "normal",
                "std_dev must be positive and finite",
            ));
        }
        let dist = Normal::new(mean, std_dev)
            .map_err(|_| GeneratorError::invalid("normal", "std_dev must be positive and finite"))?;
        Ok(Self {
            mean,
            std_dev,
            dist,
        })
    }
}

impl RvsGenerator for NormalGenerator {
    fn code(&self) -> String {
        variate_code("normal", &[self.mean, self.std_dev])
    }

    fn generate(&self, size: usize) -> Vec<f64> {
        let mut rng = rand::thread_rng();
        (0..size).map(|_| self.dist.sample(&mut rng)).collect()
    }
}

/// Exponential variates with rate `lambda`
pub struct ExponentialGenerator {
    lambda: f64,
    dist: Exp<f64>,
}

impl ExponentialGenerator {
    /// Create a generator; `lambda` must be positive and finite.
    pub fn new(lambda: f64) -> Result<Self, GeneratorError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(GeneratorError::invalid(
                "exponential",
                "lambda must be positive and finite",
            ));
        }
        let dist = Exp::new(lambda)
            .map_err(|_| GeneratorError::invalid("exponential", "lambda must be positive and finite"))?;
        Ok(Self { lambda, dist })
    }
}

impl RvsGenerator for ExponentialGenerator {
    fn code(&self) -> String {
        variate_code("exponential", &[self.lambda])
    }

    fn generate(&self, size: usize) -> Vec<f64> {
        let mut rng = rand::thread_rng();
        (0..size).map(|_| self.dist.sample(&mut rng)).collect()
    }
}

/// Weibull variates with shape `k` and scale `lambda`
pub struct WeibullGenerator {
    shape: f64,
    scale: f64,
    dist: Weibull<f64>,
}

impl WeibullGenerator {
    /// Create a generator; both parameters must be positive and finite.
    pub fn new(shape: f64, scale: f64) -> Result<Self, GeneratorError> {
        if !shape.is_finite() || shape <= 0.0 || !scale.is_finite() || scale <= 0.0 {
            return Err(GeneratorError::invalid(
                "weibull",
                "shape and scale must be positive and finite",
            ));
        }
        let dist = Weibull::new(scale, shape)
            .map_err(|_| GeneratorError::invalid("weibull", "shape and scale must be positive and finite"))?;
        Ok(Self { shape, scale, dist })
    }
}

impl RvsGenerator for WeibullGenerator {
    fn code(&self) -> String {
        variate_code("weibull", &[self.shape, self.scale])
    }

    fn generate(&self, size: usize) -> Vec<f64> {
        let mut rng = rand::thread_rng();
        (0..size).map(|_| self.dist.sample(&mut rng)).collect()
    }
}

/// Uniform variates on [low, high)
pub struct UniformGenerator {
    low: f64,
    high: f64,
}

impl UniformGenerator {
    /// Create a generator; requires finite bounds with `low < high`.
    pub fn new(low: f64, high: f64) -> Result<Self, GeneratorError> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(GeneratorError::invalid(
                "uniform",
                "bounds must be finite with low < high",
            ));
        }
        Ok(Self { low, high })
    }
}

impl RvsGenerator for UniformGenerator {
    fn code(&self) -> String {
        variate_code("uniform", &[self.low, self.high])
    }

    fn generate(&self, size: usize) -> Vec<f64> {
        let mut rng = rand::thread_rng();
        (0..size).map(|_| rng.gen_range(self.low..self.high)).collect()
    }
}

/// Cauchy variates, a heavy-tailed alternative to the normal family
pub struct CauchyGenerator {
    median: f64,
    scale: f64,
    dist: Cauchy<f64>,
}

impl CauchyGenerator {
    /// Create a generator; `median` must be finite and `scale` positive
    /// and finite.
    pub fn new(median: f64, scale: f64) -> Result<Self, GeneratorError> {
        if !median.is_finite() {
            return Err(GeneratorError::invalid("cauchy", "median must be finite"));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GeneratorError::invalid(
                "cauchy",
                "scale must be positive and finite",
            ));
        }
        let dist = Cauchy::new(median, scale)
            .map_err(|_| GeneratorError::invalid("cauchy", "scale must be positive and finite"))?;
        Ok(Self {
            median,
            scale,
            dist,
        })
    }
}

impl RvsGenerator for CauchyGenerator {
    fn code(&self) -> String {
        variate_code("cauchy", &[self.median, self.scale])
    }

    fn generate(&self, size: usize) -> Vec<f64> {
        let mut rng = rand::thread_rng();
        (0..size).map(|_| self.dist.sample(&mut rng)).collect()
    }
}
