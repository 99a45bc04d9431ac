//! Experiment Configuration
//!
//! TOML configuration describing one power study: which tests against which
//! alternatives, at which sizes and significance levels, and how the run
//! behaves (parallelism, persistence, stage skipping). Validation is
//! fail-fast: a bad config never starts a stage.

use serde::{Deserialize, Serialize};
use statpower_core::{GeneratorRegistry, GofTest, RegistryError, RvsGenerator, TestRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Configuration file name searched for by [`ExperimentConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "statpower.toml";

/// Errors from loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A named test or generator family does not resolve
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A value fails a semantic constraint
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration file schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Run-wide settings
    #[serde(default)]
    pub experiment: ExperimentSection,

    /// Tests to evaluate, each with its null-hypothesis generator
    #[serde(default)]
    pub tests: Vec<TestSpec>,

    /// Alternative distributions to draw power samples from
    #[serde(default)]
    pub alternatives: Vec<GeneratorSpec>,
}

/// `[experiment]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentSection {
    /// Sample sizes to study
    pub sizes: Vec<usize>,

    /// Target number of persisted samples per (alternative, size)
    pub sample_count: usize,

    /// Monte Carlo repetitions for critical-value calibration
    pub monte_carlo_count: usize,

    /// Significance levels to evaluate
    pub alphas: Vec<f64>,

    /// Worker count; `None` uses the available parallelism
    pub jobs: Option<usize>,

    /// Batch size for streaming results into the report builder
    pub report_batch_size: usize,

    /// Drop all persisted samples before the generation stage
    pub clear_samples: bool,

    /// Skip the generation stage
    pub skip_generation: bool,

    /// Skip the testing stage
    pub skip_testing: bool,

    /// Skip the reporting stage
    pub skip_reporting: bool,

    /// Directory for store snapshots; `None` keeps everything in memory
    pub state_dir: Option<PathBuf>,
}

impl Default for ExperimentSection {
    fn default() -> Self {
        Self {
            sizes: vec![20, 50, 100],
            sample_count: 100,
            monte_carlo_count: 1000,
            alphas: vec![0.05],
            jobs: None,
            report_batch_size: 500,
            clear_samples: false,
            skip_generation: false,
            skip_testing: false,
            skip_reporting: false,
            state_dir: None,
        }
    }
}

/// `[[tests]]` entry: a test code and the null it calibrates against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSpec {
    /// Registered test code
    pub code: String,
    /// Null-hypothesis distribution used for Monte Carlo calibration
    pub null: GeneratorSpec,
}

/// A distribution family with concrete parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSpec {
    /// Registered family name
    pub family: String,
    /// Family parameters, in declaration order
    #[serde(default)]
    pub params: Vec<f64>,
}

impl ExperimentConfig {
    /// Parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Walk up from the current directory looking for [`CONFIG_FILE_NAME`]
    pub fn discover() -> Option<PathBuf> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Check every semantic constraint and resolve every name against the
    /// registries, without constructing anything.
    pub fn validate(
        &self,
        tests: &TestRegistry,
        generators: &GeneratorRegistry,
    ) -> Result<(), ConfigError> {
        let exp = &self.experiment;
        if exp.sizes.is_empty() {
            return Err(ConfigError::Invalid("sizes must not be empty".into()));
        }
        if exp.sizes.iter().any(|&s| s == 0) {
            return Err(ConfigError::Invalid("sizes must all be at least 1".into()));
        }
        if exp.sample_count == 0 {
            return Err(ConfigError::Invalid("sample_count must be at least 1".into()));
        }
        if exp.monte_carlo_count == 0 {
            return Err(ConfigError::Invalid(
                "monte_carlo_count must be at least 1".into(),
            ));
        }
        if exp.alphas.is_empty() {
            return Err(ConfigError::Invalid("alphas must not be empty".into()));
        }
        for &alpha in &exp.alphas {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "alpha {} must be in (0, 1)",
                    alpha
                )));
            }
        }
        if exp.report_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "report_batch_size must be at least 1".into(),
            ));
        }
        if self.tests.is_empty() {
            return Err(ConfigError::Invalid("at least one [[tests]] entry is required".into()));
        }
        if self.alternatives.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[alternatives]] entry is required".into(),
            ));
        }
        for spec in &self.tests {
            tests.build(&spec.code)?;
            generators.build(&spec.null.family, &spec.null.params)?;
        }
        for spec in &self.alternatives {
            generators.build(&spec.family, &spec.params)?;
        }
        Ok(())
    }

    /// Construct the (test, null generator) pairs this config names
    pub fn resolve_tests(
        &self,
        tests: &TestRegistry,
        generators: &GeneratorRegistry,
    ) -> Result<Vec<(Arc<dyn GofTest>, Arc<dyn RvsGenerator>)>, ConfigError> {
        self.tests
            .iter()
            .map(|spec| {
                let test = tests.build(&spec.code)?;
                let null = generators.build(&spec.null.family, &spec.null.params)?;
                Ok((test, null))
            })
            .collect()
    }

    /// Construct the alternative generators this config names
    pub fn resolve_alternatives(
        &self,
        generators: &GeneratorRegistry,
    ) -> Result<Vec<Arc<dyn RvsGenerator>>, ConfigError> {
        self.alternatives
            .iter()
            .map(|spec| Ok(generators.build(&spec.family, &spec.params)?))
            .collect()
    }

    /// Effective worker count
    pub fn jobs(&self) -> usize {
        self.experiment.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Annotated starter configuration written by `statpower init`
pub fn default_toml() -> &'static str {
    r#"# statpower experiment configuration

[experiment]
# Sample sizes to study
sizes = [20, 50, 100]
# Persisted samples per (alternative, size)
sample_count = 100
# Monte Carlo repetitions for critical-value calibration
monte_carlo_count = 1000
# Significance levels
alphas = [0.05]
# Worker count (defaults to available parallelism)
# jobs = 4
# Results streamed into the report in batches of this size
report_batch_size = 500
# Directory for store snapshots (omit to keep everything in memory)
# state_dir = ".statpower"

# Tests to evaluate, each with the null it calibrates against
[[tests]]
code = "ks_norm"
null = { family = "normal", params = [0.0, 1.0] }

[[tests]]
code = "ks_exp"
null = { family = "exponential", params = [1.0] }

# Alternatives to measure power against
[[alternatives]]
family = "uniform"
params = [0.0, 1.0]

[[alternatives]]
family = "cauchy"
params = [0.0, 1.0]
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registries() -> (TestRegistry, GeneratorRegistry) {
        (TestRegistry::with_builtins(), GeneratorRegistry::with_builtins())
    }

    #[test]
    fn default_toml_parses_and_validates() {
        let config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        let (tests, generators) = registries();
        config.validate(&tests, &generators).unwrap();

        assert_eq!(config.experiment.sizes, vec![20, 50, 100]);
        assert_eq!(config.tests.len(), 2);
        assert_eq!(config.alternatives.len(), 2);
    }

    #[test]
    fn minimal_config_gets_defaults() {
        let config: ExperimentConfig = toml::from_str(
            r#"
            [[tests]]
            code = "ks_norm"
            null = { family = "normal", params = [0.0, 1.0] }

            [[alternatives]]
            family = "uniform"
            params = [0.0, 1.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.experiment.sample_count, 100);
        assert_eq!(config.experiment.monte_carlo_count, 1000);
        assert_eq!(config.experiment.alphas, vec![0.05]);
        assert!(!config.experiment.clear_samples);
    }

    #[test]
    fn validation_rejects_bad_alpha() {
        let mut config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        config.experiment.alphas = vec![0.05, 1.5];
        let (tests, generators) = registries();
        assert!(matches!(
            config.validate(&tests, &generators),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn validation_rejects_zero_size_and_empty_lists() {
        let (tests, generators) = registries();

        let mut config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        config.experiment.sizes = vec![50, 0];
        assert!(config.validate(&tests, &generators).is_err());

        let mut config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        config.tests.clear();
        assert!(config.validate(&tests, &generators).is_err());
    }

    #[test]
    fn validation_rejects_unknown_names() {
        let (tests, generators) = registries();

        let mut config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        config.tests[0].code = "ks_made_up".into();
        assert!(matches!(
            config.validate(&tests, &generators),
            Err(ConfigError::Registry(RegistryError::UnknownTest(_)))
        ));

        let mut config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        config.alternatives[0].family = "zeta".into();
        assert!(matches!(
            config.validate(&tests, &generators),
            Err(ConfigError::Registry(RegistryError::UnknownFamily(_)))
        ));
    }

    #[test]
    fn validation_rejects_out_of_domain_params() {
        let (tests, generators) = registries();

        // Right arity, impossible distribution: must fail before any stage
        let mut config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        config.alternatives[0].params = vec![0.0, -1.0]; // uniform with low >= high
        assert!(matches!(
            config.validate(&tests, &generators),
            Err(ConfigError::Registry(RegistryError::Generator(_)))
        ));

        let mut config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        config.tests[0].null.params = vec![0.0, -1.0]; // normal with negative std_dev
        assert!(matches!(
            config.validate(&tests, &generators),
            Err(ConfigError::Registry(RegistryError::Generator(_)))
        ));
    }

    #[test]
    fn resolution_builds_named_capabilities() {
        let config: ExperimentConfig = toml::from_str(default_toml()).unwrap();
        let (tests, generators) = registries();

        let resolved = config.resolve_tests(&tests, &generators).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0.code(), "ks_norm");
        assert_eq!(resolved[0].1.code(), "normal_0_1");

        let alternatives = config.resolve_alternatives(&generators).unwrap();
        assert_eq!(alternatives[0].code(), "uniform_0_1");
    }
}
