//! Experiment Pipeline
//!
//! Runs the three stages in fixed order over shared stores:
//!
//! - generation: draw alternative samples and persist them
//! - testing: evaluate every (test, stored sample set, alpha) combination
//! - reporting: stream persisted results into a report builder in batches
//!
//! Stages communicate only through the stores, so any stage can be skipped
//! and the remaining ones still operate on whatever state is persisted.
//! Observers fire around stages that actually run; skipped stages fire
//! nothing.

use crate::executor::calculator::CriticalValueCalculator;
use crate::executor::observer::{Stage, StageObserver};
use crate::executor::worker::{PowerCalculationWorker, WorkerError};
use crate::supervisor::{SupervisorError, WorkerPool};
use statpower_core::{GofTest, RvsGenerator, result_key};
use statpower_report::{ReportBuilder, ReportError};
use statpower_store::{CriticalValueStore, ResultStore, SampleStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors aborting a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A store operation failed during the named stage
    #[error("Store failure during {stage}: {source}")]
    Store {
        /// Stage that was running
        stage: &'static str,
        /// Underlying store error
        #[source]
        source: StoreError,
    },

    /// A power evaluation failed
    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// The report builder failed
    #[error(transparent)]
    Report(#[from] ReportError),

    /// The worker pool could not be coordinated
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

fn store_err(stage: &'static str) -> impl Fn(StoreError) -> PipelineError {
    move |source| PipelineError::Store { stage, source }
}

/// Run-wide behavior knobs, decoupled from the config file schema
#[derive(Debug, Clone)]
pub struct ExperimentSettings {
    /// Sample sizes to study
    pub sizes: Vec<usize>,
    /// Target persisted samples per (alternative, size)
    pub sample_count: usize,
    /// Monte Carlo repetitions for calibration
    pub monte_carlo_count: usize,
    /// Significance levels
    pub alphas: Vec<f64>,
    /// Worker count
    pub jobs: usize,
    /// Report streaming batch size
    pub report_batch_size: usize,
    /// Drop persisted samples before generating
    pub clear_samples: bool,
    /// Skip the generation stage
    pub skip_generation: bool,
    /// Skip the testing stage
    pub skip_testing: bool,
    /// Skip the reporting stage
    pub skip_reporting: bool,
}

/// One test paired with the null it calibrates against
pub struct TestEntry {
    /// The test statistic
    pub test: Arc<dyn GofTest>,
    /// Null-hypothesis sample source for Monte Carlo calibration
    pub null_generator: Arc<dyn RvsGenerator>,
}

struct GenerationItem {
    generator: Arc<dyn RvsGenerator>,
    size: usize,
    remaining: usize,
}

struct TestingItem {
    test: Arc<dyn GofTest>,
    null_generator: Arc<dyn RvsGenerator>,
    alternative_code: String,
    size: usize,
    alpha: f64,
}

/// The whole experiment: hypotheses, data sources, stores, and observers
pub struct Experiment {
    settings: ExperimentSettings,
    tests: Vec<TestEntry>,
    alternatives: Vec<Arc<dyn RvsGenerator>>,
    sample_store: Arc<dyn SampleStore>,
    critical_value_store: Arc<dyn CriticalValueStore>,
    result_store: Arc<dyn ResultStore>,
    observers: Vec<Arc<dyn StageObserver>>,
}

impl Experiment {
    /// Assemble an experiment over the given stores
    pub fn new(
        settings: ExperimentSettings,
        tests: Vec<TestEntry>,
        alternatives: Vec<Arc<dyn RvsGenerator>>,
        sample_store: Arc<dyn SampleStore>,
        critical_value_store: Arc<dyn CriticalValueStore>,
        result_store: Arc<dyn ResultStore>,
    ) -> Self {
        Self {
            settings,
            tests,
            alternatives,
            sample_store,
            critical_value_store,
            result_store,
            observers: Vec::new(),
        }
    }

    /// Attach a lifecycle observer
    pub fn add_observer(&mut self, observer: Arc<dyn StageObserver>) {
        self.observers.push(observer);
    }

    fn notify_before(&self, stage: Stage) {
        for observer in &self.observers {
            observer.before(stage);
        }
    }

    fn notify_after(&self, stage: Stage) {
        for observer in &self.observers {
            observer.after(stage);
        }
    }

    /// Run every non-skipped stage in order.
    ///
    /// Returns the rendered report when the reporting stage ran, `None`
    /// otherwise.
    pub fn run(
        &self,
        report_builder: &mut dyn ReportBuilder,
    ) -> Result<Option<String>, PipelineError> {
        self.sample_store.init().map_err(store_err("init"))?;
        self.critical_value_store.init().map_err(store_err("init"))?;
        self.result_store.init().map_err(store_err("init"))?;

        if self.settings.skip_generation {
            info!(stage = "generation", "stage skipped");
        } else {
            self.notify_before(Stage::Generation);
            self.run_generation()?;
            self.notify_after(Stage::Generation);
        }

        if self.settings.skip_testing {
            info!(stage = "testing", "stage skipped");
        } else {
            self.notify_before(Stage::Testing);
            self.run_testing()?;
            self.notify_after(Stage::Testing);
        }

        if self.settings.skip_reporting {
            info!(stage = "reporting", "stage skipped");
            return Ok(None);
        }
        self.notify_before(Stage::Reporting);
        let report = self.run_reporting(report_builder)?;
        self.notify_after(Stage::Reporting);
        Ok(Some(report))
    }

    /// Top up every (alternative, size) sample set to the configured count.
    ///
    /// Existing samples are kept and counted toward the target, so re-running
    /// generation is incremental rather than duplicating work.
    fn run_generation(&self) -> Result<(), PipelineError> {
        if self.settings.clear_samples {
            info!("clearing persisted samples before generation");
            self.sample_store
                .clear_all_rvs()
                .map_err(store_err("generation"))?;
        }

        let mut items = Vec::new();
        for generator in &self.alternatives {
            let code = generator.code();
            for &size in &self.settings.sizes {
                let existing = self
                    .sample_store
                    .get_rvs_count(&code, size)
                    .map_err(store_err("generation"))?;
                let remaining = self.settings.sample_count.saturating_sub(existing);
                if remaining > 0 {
                    items.push(GenerationItem {
                        generator: generator.clone(),
                        size,
                        remaining,
                    });
                }
            }
        }
        info!(
            combinations = items.len(),
            target = self.settings.sample_count,
            "generation plan ready"
        );

        let pool = WorkerPool::new(self.settings.jobs);
        let sample_store = self.sample_store.clone();
        pool.run("generating samples", items, move |item, progress| {
            let samples: Vec<Vec<f64>> = (0..item.remaining)
                .map(|_| item.generator.generate(item.size))
                .collect();
            sample_store
                .insert_all_rvs(&item.generator.code(), item.size, samples)
                .map_err(store_err("generation"))?;
            progress.tick();
            Ok(())
        })
    }

    /// Evaluate every test against every persisted sample set at every alpha.
    ///
    /// The worklist comes from the sample store, not the generation plan, so
    /// testing over a pre-populated store works with generation skipped. An
    /// empty store yields an empty worklist and the stage is a no-op.
    fn run_testing(&self) -> Result<(), PipelineError> {
        let stat = self
            .sample_store
            .get_rvs_stat()
            .map_err(store_err("testing"))?;

        let mut items = Vec::new();
        for entry in &self.tests {
            for (code, size, count) in &stat {
                if *count == 0 {
                    continue;
                }
                for &alpha in &self.settings.alphas {
                    items.push(TestingItem {
                        test: entry.test.clone(),
                        null_generator: entry.null_generator.clone(),
                        alternative_code: code.clone(),
                        size: *size,
                        alpha,
                    });
                }
            }
        }
        if items.is_empty() {
            info!("sample store holds nothing to test");
            return Ok(());
        }
        info!(combinations = items.len(), "testing plan ready");

        // One calculator for the whole stage: its cache is shared across
        // workers, so each (test, size, alpha) is calibrated at most once
        // per run.
        let calculator = Arc::new(CriticalValueCalculator::new(
            self.critical_value_store.clone(),
        ));
        let worker = PowerCalculationWorker::new(self.settings.monte_carlo_count);
        let sample_store = self.sample_store.clone();
        let result_store = self.result_store.clone();

        let pool = WorkerPool::new(self.settings.jobs);
        pool.run("evaluating power", items, move |item, progress| {
            let samples = sample_store
                .get_rvs(&item.alternative_code, item.size)
                .map_err(store_err("testing"))?;
            let result = worker.execute(
                item.test.as_ref(),
                item.null_generator.as_ref(),
                &calculator,
                &samples,
                &item.alternative_code,
                item.size,
                item.alpha,
            )?;
            let key = result_key(
                &result.test_code,
                &result.generator_code,
                result.size,
                result.alpha,
            );
            result_store
                .insert_result(&key, result)
                .map_err(store_err("testing"))?;
            progress.tick();
            Ok(())
        })
    }

    /// Stream persisted results into the builder in batches and render.
    fn run_reporting(
        &self,
        report_builder: &mut dyn ReportBuilder,
    ) -> Result<String, PipelineError> {
        let batch_size = self.settings.report_batch_size;
        let mut offset = 0usize;
        loop {
            let batch = self
                .result_store
                .get_results(offset, batch_size)
                .map_err(store_err("reporting"))?;
            for result in &batch {
                report_builder.process(result)?;
            }
            offset += batch.len();
            if batch.len() < batch_size {
                break;
            }
        }
        info!(results = offset, "report assembled");
        Ok(report_builder.build()?)
    }
}
