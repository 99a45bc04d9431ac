#![warn(missing_docs)]
//! Statpower Core - Capabilities and Data Model
//!
//! This crate provides the vocabulary shared by every stage of a power
//! experiment:
//! - `GofTest` capability: a goodness-of-fit test statistic with an optional
//!   analytic critical value
//! - `RvsGenerator` capability: a random-variate source with a stable code
//! - `CriticalValue` / `PowerResult` data model
//! - String-code registries resolving configuration entries to capabilities

mod generator;
mod registry;
mod types;

pub use generator::{
    CauchyGenerator, ExponentialGenerator, GeneratorError, NormalGenerator, RvsGenerator,
    UniformGenerator, WeibullGenerator, variate_code,
};
pub use registry::{GeneratorRegistry, RegistryError, TestRegistry};
pub use test::{
    GofTest, KolmogorovSmirnovExponentialityTest, KolmogorovSmirnovNormalityTest,
    KolmogorovSmirnovUniformityTest,
};
pub use types::{CriticalValue, PowerResult, result_key};
