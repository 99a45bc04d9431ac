//! Capability Registries
//!
//! Explicit string-code registries populated at startup. Configuration files
//! name tests and generator families by code; the registries resolve those
//! names to constructors without any runtime reflection.

use crate::generator::{
    CauchyGenerator, ExponentialGenerator, GeneratorError, NormalGenerator, RvsGenerator,
    UniformGenerator, WeibullGenerator,
};
use crate::test::{
    GofTest, KolmogorovSmirnovExponentialityTest, KolmogorovSmirnovNormalityTest,
    KolmogorovSmirnovUniformityTest,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from registry resolution
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No test registered under the requested code
    #[error("Unknown test code: {0}")]
    UnknownTest(String),

    /// No generator family registered under the requested name
    #[error("Unknown generator family: {0}")]
    UnknownFamily(String),

    /// The family exists but the parameter list does not fit it
    #[error("Family '{family}' expects {expected} parameter(s), got {got}")]
    BadParams {
        /// Family name
        family: String,
        /// Expected parameter count
        expected: usize,
        /// Provided parameter count
        got: usize,
    },

    /// The parameters have the right arity but fall outside the family's domain
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

type TestFactory = Box<dyn Fn() -> Arc<dyn GofTest> + Send + Sync>;
type GeneratorFactory = Box<dyn Fn(&[f64]) -> Result<Arc<dyn RvsGenerator>, RegistryError> + Send + Sync>;

/// Registry mapping test codes to constructors
pub struct TestRegistry {
    factories: HashMap<String, TestFactory>,
}

impl TestRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in test statistics
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("ks_norm", || Arc::new(KolmogorovSmirnovNormalityTest));
        registry.register("ks_exp", || Arc::new(KolmogorovSmirnovExponentialityTest));
        registry.register("ks_uniform", || Arc::new(KolmogorovSmirnovUniformityTest));
        registry
    }

    /// Register a test constructor under a code, replacing any previous entry
    pub fn register<F>(&mut self, code: &str, factory: F)
    where
        F: Fn() -> Arc<dyn GofTest> + Send + Sync + 'static,
    {
        self.factories.insert(code.to_string(), Box::new(factory));
    }

    /// Construct the test registered under `code`
    pub fn build(&self, code: &str) -> Result<Arc<dyn GofTest>, RegistryError> {
        self.factories
            .get(code)
            .map(|f| f())
            .ok_or_else(|| RegistryError::UnknownTest(code.to_string()))
    }

    /// All registered codes, sorted
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.factories.keys().cloned().collect();
        codes.sort();
        codes
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Registry mapping distribution family names to parameterized constructors
pub struct GeneratorRegistry {
    factories: HashMap<String, GeneratorFactory>,
}

fn expect_params(family: &str, params: &[f64], expected: usize) -> Result<(), RegistryError> {
    if params.len() == expected {
        Ok(())
    } else {
        Err(RegistryError::BadParams {
            family: family.to_string(),
            expected,
            got: params.len(),
        })
    }
}

impl GeneratorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry pre-populated with the built-in distribution families
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("normal", |params| {
            expect_params("normal", params, 2)?;
            Ok(Arc::new(NormalGenerator::new(params[0], params[1])?))
        });
        registry.register("exponential", |params| {
            expect_params("exponential", params, 1)?;
            Ok(Arc::new(ExponentialGenerator::new(params[0])?))
        });
        registry.register("weibull", |params| {
            expect_params("weibull", params, 2)?;
            Ok(Arc::new(WeibullGenerator::new(params[0], params[1])?))
        });
        registry.register("uniform", |params| {
            expect_params("uniform", params, 2)?;
            Ok(Arc::new(UniformGenerator::new(params[0], params[1])?))
        });
        registry.register("cauchy", |params| {
            expect_params("cauchy", params, 2)?;
            Ok(Arc::new(CauchyGenerator::new(params[0], params[1])?))
        });
        registry
    }

    /// Register a family constructor, replacing any previous entry
    pub fn register<F>(&mut self, family: &str, factory: F)
    where
        F: Fn(&[f64]) -> Result<Arc<dyn RvsGenerator>, RegistryError> + Send + Sync + 'static,
    {
        self.factories.insert(family.to_string(), Box::new(factory));
    }

    /// Construct a generator for `family` with the given parameters
    pub fn build(&self, family: &str, params: &[f64]) -> Result<Arc<dyn RvsGenerator>, RegistryError> {
        let factory = self
            .factories
            .get(family)
            .ok_or_else(|| RegistryError::UnknownFamily(family.to_string()))?;
        factory(params)
    }

    /// All registered family names, sorted
    pub fn families(&self) -> Vec<String> {
        let mut families: Vec<String> = self.factories.keys().cloned().collect();
        families.sort();
        families
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tests_resolve() {
        let registry = TestRegistry::with_builtins();
        assert_eq!(registry.build("ks_norm").unwrap().code(), "ks_norm");
        assert_eq!(registry.build("ks_exp").unwrap().code(), "ks_exp");
        assert!(matches!(
            registry.build("nope"),
            Err(RegistryError::UnknownTest(_))
        ));
    }

    #[test]
    fn builtin_generators_resolve() {
        let registry = GeneratorRegistry::with_builtins();
        let g = registry.build("normal", &[0.0, 1.0]).unwrap();
        assert_eq!(g.code(), "normal_0_1");
        assert!(matches!(
            registry.build("zeta", &[1.0]),
            Err(RegistryError::UnknownFamily(_))
        ));
    }

    #[test]
    fn bad_param_count_rejected() {
        let registry = GeneratorRegistry::with_builtins();
        assert!(matches!(
            registry.build("normal", &[0.0]),
            Err(RegistryError::BadParams { expected: 2, .. })
        ));
    }

    #[test]
    fn out_of_domain_params_rejected() {
        let registry = GeneratorRegistry::with_builtins();
        assert!(matches!(
            registry.build("normal", &[0.0, -1.0]),
            Err(RegistryError::Generator(_))
        ));
        assert!(matches!(
            registry.build("exponential", &[0.0]),
            Err(RegistryError::Generator(_))
        ));
        assert!(matches!(
            registry.build("uniform", &[1.0, 1.0]),
            Err(RegistryError::Generator(_))
        ));
    }

    #[test]
    fn custom_registration_overrides() {
        let mut registry = TestRegistry::with_builtins();
        registry.register("ks_norm", || Arc::new(KolmogorovSmirnovUniformityTest));
        // Replaced entry now builds the uniformity test
        assert_eq!(registry.build("ks_norm").unwrap().code(), "ks_uniform");
    }

    #[test]
    fn listings_are_sorted() {
        let tests = TestRegistry::with_builtins();
        assert_eq!(tests.codes(), vec!["ks_exp", "ks_norm", "ks_uniform"]);
        let gens = GeneratorRegistry::with_builtins();
        assert_eq!(
            gens.families(),
            vec!["cauchy", "exponential", "normal", "uniform", "weibull"]
        );
    }
}
