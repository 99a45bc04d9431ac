#![warn(missing_docs)]
//! Statpower - Monte Carlo Power Studies for Goodness-of-Fit Tests
//!
//! Statpower estimates the power of goodness-of-fit tests against chosen
//! alternative distributions by simulation. Critical values with no closed
//! form are calibrated once by Monte Carlo and cached in a persistent store,
//! so repeated studies reuse earlier calibration work.
//!
//! An experiment runs three stages over shared stores:
//! 1. generation: draw and persist samples from each alternative
//! 2. testing: evaluate each test over the persisted samples at each alpha
//! 3. reporting: stream persisted results into a report
//!
//! # Example
//!
//! ```
//! use statpower::prelude::*;
//! use std::sync::Arc;
//!
//! let settings = ExperimentSettings {
//!     sizes: vec![30],
//!     sample_count: 20,
//!     monte_carlo_count: 200,
//!     alphas: vec![0.05],
//!     jobs: 2,
//!     report_batch_size: 100,
//!     clear_samples: false,
//!     skip_generation: false,
//!     skip_testing: false,
//!     skip_reporting: false,
//! };
//! let experiment = Experiment::new(
//!     settings,
//!     vec![TestEntry {
//!         test: Arc::new(KolmogorovSmirnovNormalityTest),
//!         null_generator: Arc::new(NormalGenerator::new(0.0, 1.0).unwrap()),
//!     }],
//!     vec![Arc::new(UniformGenerator::new(0.0, 1.0).unwrap())],
//!     Arc::new(MemorySampleStore::new()),
//!     Arc::new(MemoryCriticalValueStore::new()),
//!     Arc::new(MemoryResultStore::new()),
//! );
//! let mut builder = TextReportBuilder::new();
//! let report = experiment.run(&mut builder).unwrap();
//! assert!(report.is_some());
//! ```

pub use statpower_cli::config::{ConfigError, ExperimentConfig, GeneratorSpec, TestSpec};
pub use statpower_cli::executor::{
    CalculatorError, CriticalValueCalculator, LoggingObserver, PowerCalculationWorker, Stage,
    StageObserver, TimingObserver, WorkerError,
};
pub use statpower_cli::pipeline::{Experiment, ExperimentSettings, PipelineError, TestEntry};
pub use statpower_cli::supervisor::{ProgressHandle, WorkerPool};
pub use statpower_core::{
    CriticalValue, GeneratorError, GeneratorRegistry, GofTest, PowerResult, RvsGenerator,
    TestRegistry, result_key,
};
pub use statpower_report::{
    JsonReportBuilder, OutputFormat, PowerReport, ReportBuilder, TextReportBuilder,
};
pub use statpower_stats::{
    EcdfError, ecdf_quantile, one_sided_critical_value, two_sided_critical_values,
};
pub use statpower_store::{
    CriticalValueStore, MemoryCriticalValueStore, MemoryResultStore, MemorySampleStore,
    ResultStore, SampleStore, StoreError,
};

/// Everything needed to assemble and run an experiment
pub mod prelude {
    pub use statpower_cli::executor::{StageObserver, TimingObserver};
    pub use statpower_cli::pipeline::{Experiment, ExperimentSettings, TestEntry};
    pub use statpower_core::{
        CauchyGenerator, CriticalValue, ExponentialGenerator, GofTest,
        KolmogorovSmirnovExponentialityTest, KolmogorovSmirnovNormalityTest,
        KolmogorovSmirnovUniformityTest, NormalGenerator, PowerResult, RvsGenerator,
        UniformGenerator, WeibullGenerator, result_key,
    };
    pub use statpower_report::{JsonReportBuilder, ReportBuilder, TextReportBuilder};
    pub use statpower_store::{
        CriticalValueStore, MemoryCriticalValueStore, MemoryResultStore, MemorySampleStore,
        ResultStore, SampleStore,
    };
}
