//! End-to-end experiment runs over in-memory stores.

use statpower::PowerReport;
use statpower::prelude::*;
use std::sync::Arc;

fn settings() -> ExperimentSettings {
    ExperimentSettings {
        sizes: vec![30],
        sample_count: 50,
        monte_carlo_count: 1000,
        alphas: vec![0.05],
        jobs: 2,
        report_batch_size: 100,
        clear_samples: false,
        skip_generation: false,
        skip_testing: false,
        skip_reporting: false,
    }
}

struct Fixture {
    samples: Arc<MemorySampleStore>,
    critical_values: Arc<MemoryCriticalValueStore>,
    results: Arc<MemoryResultStore>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            samples: Arc::new(MemorySampleStore::new()),
            critical_values: Arc::new(MemoryCriticalValueStore::new()),
            results: Arc::new(MemoryResultStore::new()),
        }
    }

    fn experiment(&self, settings: ExperimentSettings) -> Experiment {
        Experiment::new(
            settings,
            vec![TestEntry {
                test: Arc::new(KolmogorovSmirnovNormalityTest),
                null_generator: Arc::new(NormalGenerator::new(0.0, 1.0).unwrap()),
            }],
            vec![Arc::new(UniformGenerator::new(0.0, 1.0).unwrap())],
            self.samples.clone(),
            self.critical_values.clone(),
            self.results.clone(),
        )
    }
}

#[test]
fn full_study_calibrates_once_and_reports() {
    let fixture = Fixture::new();
    let experiment = fixture.experiment(settings());
    let mut builder = JsonReportBuilder::new(1000);

    let report = experiment.run(&mut builder).unwrap().unwrap();

    // One test at one (size, alpha): exactly one calibration happened
    assert_eq!(fixture.critical_values.critical_value_rows().unwrap(), 1);
    assert_eq!(fixture.critical_values.distribution_rows().unwrap(), 1);
    assert_eq!(fixture.samples.get_rvs_count("uniform_0_1", 30).unwrap(), 50);

    let result = fixture
        .results
        .get_result(&result_key("ks_norm", "uniform_0_1", 30, 0.05))
        .unwrap()
        .unwrap();
    assert!((0.0..=1.0).contains(&result.power));

    let parsed: PowerReport = serde_json::from_str(&report).unwrap();
    assert_eq!(parsed.results.len(), 1);
    assert_eq!(parsed.meta.monte_carlo_count, 1000);
}

#[test]
fn second_run_reproduces_identical_power() {
    let fixture = Fixture::new();
    let experiment = fixture.experiment(settings());
    let key = result_key("ks_norm", "uniform_0_1", 30, 0.05);

    let mut builder = TextReportBuilder::new();
    experiment.run(&mut builder).unwrap();
    let first = fixture.results.get_result(&key).unwrap().unwrap();

    // Samples and critical value are both persisted, so re-testing the same
    // state is fully deterministic.
    let mut builder = TextReportBuilder::new();
    experiment.run(&mut builder).unwrap();
    let second = fixture.results.get_result(&key).unwrap().unwrap();

    assert!((first.power - second.power).abs() < f64::EPSILON);
    assert_eq!(fixture.samples.get_rvs_count("uniform_0_1", 30).unwrap(), 50);
    assert_eq!(fixture.critical_values.critical_value_rows().unwrap(), 1);
    assert_eq!(fixture.results.len().unwrap(), 1);
}

#[test]
fn empty_store_with_generation_skipped_is_a_noop() {
    let fixture = Fixture::new();
    let mut config = settings();
    config.skip_generation = true;
    let experiment = fixture.experiment(config);

    let mut builder = TextReportBuilder::new();
    let report = experiment.run(&mut builder).unwrap().unwrap();

    assert!(fixture.results.is_empty().unwrap());
    assert_eq!(fixture.critical_values.critical_value_rows().unwrap(), 0);
    assert!(report.contains("No results."));
}

#[test]
fn alphas_share_one_null_distribution() {
    let fixture = Fixture::new();
    let mut config = settings();
    config.alphas = vec![0.01, 0.05, 0.1];
    let experiment = fixture.experiment(config);

    let mut builder = TextReportBuilder::new();
    experiment.run(&mut builder).unwrap();

    // Three thresholds derived from a single simulated distribution
    assert_eq!(fixture.critical_values.critical_value_rows().unwrap(), 3);
    assert_eq!(fixture.critical_values.distribution_rows().unwrap(), 1);
    assert_eq!(fixture.results.len().unwrap(), 3);

    // Stricter alpha never yields higher power
    let p = |alpha: f64| {
        fixture
            .results
            .get_result(&result_key("ks_norm", "uniform_0_1", 30, alpha))
            .unwrap()
            .unwrap()
            .power
    };
    assert!(p(0.01) <= p(0.05));
    assert!(p(0.05) <= p(0.1));
}

#[test]
fn heavy_tailed_alternative_is_easily_rejected() {
    let fixture = Fixture::new();
    let mut config = settings();
    config.sizes = vec![100];
    let experiment = Experiment::new(
        config,
        vec![TestEntry {
            test: Arc::new(KolmogorovSmirnovNormalityTest),
            null_generator: Arc::new(NormalGenerator::new(0.0, 1.0).unwrap()),
        }],
        vec![Arc::new(CauchyGenerator::new(0.0, 1.0).unwrap())],
        fixture.samples.clone(),
        fixture.critical_values.clone(),
        fixture.results.clone(),
    );

    let mut builder = TextReportBuilder::new();
    experiment.run(&mut builder).unwrap();

    let result = fixture
        .results
        .get_result(&result_key("ks_norm", "cauchy_0_1", 100, 0.05))
        .unwrap()
        .unwrap();
    assert!(
        result.power > 0.5,
        "Cauchy data should defeat a normality test at n=100, got power {}",
        result.power
    );
}

#[test]
fn stored_threshold_is_the_distribution_quantile() {
    let fixture = Fixture::new();
    let experiment = fixture.experiment(settings());
    let mut builder = TextReportBuilder::new();
    experiment.run(&mut builder).unwrap();

    let distribution = fixture
        .critical_values
        .get_distribution("ks_norm", 30)
        .unwrap()
        .unwrap();
    let stored = fixture
        .critical_values
        .get_critical_value("ks_norm", 30, 0.05)
        .unwrap()
        .unwrap();

    let derived = statpower::one_sided_critical_value(&distribution, 0.05).unwrap();
    assert_eq!(stored, CriticalValue::OneSided(derived));
}

#[test]
fn state_survives_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let samples_path = dir.path().join("samples.json");
    let cv_path = dir.path().join("critical_values.json");

    let fixture = Fixture::new();
    let experiment = fixture.experiment(settings());
    let mut builder = TextReportBuilder::new();
    experiment.run(&mut builder).unwrap();
    let key = result_key("ks_norm", "uniform_0_1", 30, 0.05);
    let original = fixture.results.get_result(&key).unwrap().unwrap();

    fixture.samples.save(&samples_path).unwrap();
    fixture.critical_values.save(&cv_path).unwrap();

    // Fresh stores from snapshots, generation skipped: testing runs purely
    // off persisted state and reproduces the same power.
    let reloaded = Fixture {
        samples: Arc::new(MemorySampleStore::load(&samples_path).unwrap()),
        critical_values: Arc::new(MemoryCriticalValueStore::load(&cv_path).unwrap()),
        results: Arc::new(MemoryResultStore::new()),
    };
    let mut config = settings();
    config.skip_generation = true;
    let experiment = reloaded.experiment(config);
    let mut builder = TextReportBuilder::new();
    experiment.run(&mut builder).unwrap();

    let replayed = reloaded.results.get_result(&key).unwrap().unwrap();
    assert!((original.power - replayed.power).abs() < f64::EPSILON);
}
