//! Statpower CLI - Experiment Runner
//!
//! Command-line front end wiring configuration, registries, stores, and the
//! pipeline together. The library exposes the pipeline pieces so embedders
//! can assemble experiments without the binary.

pub mod config;
pub mod executor;
pub mod pipeline;
pub mod supervisor;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use config::{CONFIG_FILE_NAME, ExperimentConfig, default_toml};
use executor::{LoggingObserver, Stage, TimingObserver};
use pipeline::{Experiment, ExperimentSettings, TestEntry};
use statpower_core::{GeneratorRegistry, TestRegistry};
use statpower_report::{
    JsonReportBuilder, OutputFormat, ReportBuilder, TextReportBuilder,
};
use statpower_store::{
    CriticalValueStore, MemoryCriticalValueStore, MemoryResultStore, MemorySampleStore,
    ResultStore, SampleStore,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

const SAMPLES_SNAPSHOT: &str = "samples.json";
const CRITICAL_VALUES_SNAPSHOT: &str = "critical_values.json";
const RESULTS_SNAPSHOT: &str = "results.json";

/// Monte Carlo power studies for goodness-of-fit tests
#[derive(Parser)]
#[command(name = "statpower", version, about)]
pub struct Cli {
    /// Path to the configuration file (defaults to discovering statpower.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the experiment pipeline (the default)
    Run(RunArgs),
    /// Print the run plan without executing anything
    Plan,
    /// Write an annotated starter configuration to the current directory
    Init,
    /// Drop every persisted sample from the state directory
    Clear,
}

#[derive(Args)]
struct RunArgs {
    /// Report format: json or human
    #[arg(long, default_value = "human")]
    format: String,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker count (overrides the config)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Skip the generation stage
    #[arg(long)]
    skip_generation: bool,

    /// Skip the testing stage
    #[arg(long)]
    skip_testing: bool,

    /// Skip the reporting stage
    #[arg(long)]
    skip_reporting: bool,

    /// Drop persisted samples before generating
    #[arg(long)]
    clear_samples: bool,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            output: None,
            jobs: None,
            skip_generation: false,
            skip_testing: false,
            skip_reporting: false,
            clear_samples: false,
        }
    }
}

/// Binary entry point
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run_experiment(cli.config.as_deref(), args),
        Commands::Plan => print_plan(cli.config.as_deref()),
        Commands::Init => write_starter_config(),
        Commands::Clear => clear_samples(cli.config.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "statpower=debug,info" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<ExperimentConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match ExperimentConfig::discover() {
            Some(path) => path,
            None => bail!(
                "No {} found in this directory or any parent; run `statpower init` to create one",
                CONFIG_FILE_NAME
            ),
        },
    };
    info!(config = %path.display(), "loading configuration");
    ExperimentConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

struct Stores {
    samples: Arc<MemorySampleStore>,
    critical_values: Arc<MemoryCriticalValueStore>,
    results: Arc<MemoryResultStore>,
}

impl Stores {
    /// Load snapshots from the state directory when present, otherwise start
    /// empty.
    fn open(state_dir: Option<&Path>) -> anyhow::Result<Self> {
        let load = |name: &str| state_dir.map(|d| d.join(name)).filter(|p| p.is_file());

        let samples = match load(SAMPLES_SNAPSHOT) {
            Some(path) => Arc::new(MemorySampleStore::load(&path)?),
            None => Arc::new(MemorySampleStore::new()),
        };
        let critical_values = match load(CRITICAL_VALUES_SNAPSHOT) {
            Some(path) => Arc::new(MemoryCriticalValueStore::load(&path)?),
            None => Arc::new(MemoryCriticalValueStore::new()),
        };
        let results = match load(RESULTS_SNAPSHOT) {
            Some(path) => Arc::new(MemoryResultStore::load(&path)?),
            None => Arc::new(MemoryResultStore::new()),
        };
        Ok(Self {
            samples,
            critical_values,
            results,
        })
    }

    fn save(&self, state_dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(state_dir)
            .with_context(|| format!("Failed to create state dir {}", state_dir.display()))?;
        self.samples.save(state_dir.join(SAMPLES_SNAPSHOT))?;
        self.critical_values
            .save(state_dir.join(CRITICAL_VALUES_SNAPSHOT))?;
        self.results.save(state_dir.join(RESULTS_SNAPSHOT))?;
        info!(state_dir = %state_dir.display(), "store snapshots written");
        Ok(())
    }
}

fn run_experiment(config_path: Option<&Path>, args: RunArgs) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(jobs) = args.jobs {
        config.experiment.jobs = Some(jobs);
    }
    config.experiment.skip_generation |= args.skip_generation;
    config.experiment.skip_testing |= args.skip_testing;
    config.experiment.skip_reporting |= args.skip_reporting;
    config.experiment.clear_samples |= args.clear_samples;

    let tests = TestRegistry::with_builtins();
    let generators = GeneratorRegistry::with_builtins();
    config.validate(&tests, &generators)?;

    let format = OutputFormat::from_str(&args.format).map_err(anyhow::Error::msg)?;

    let stores = Stores::open(config.experiment.state_dir.as_deref())?;

    let settings = ExperimentSettings {
        sizes: config.experiment.sizes.clone(),
        sample_count: config.experiment.sample_count,
        monte_carlo_count: config.experiment.monte_carlo_count,
        alphas: config.experiment.alphas.clone(),
        jobs: config.jobs(),
        report_batch_size: config.experiment.report_batch_size,
        clear_samples: config.experiment.clear_samples,
        skip_generation: config.experiment.skip_generation,
        skip_testing: config.experiment.skip_testing,
        skip_reporting: config.experiment.skip_reporting,
    };

    let test_entries: Vec<TestEntry> = config
        .resolve_tests(&tests, &generators)?
        .into_iter()
        .map(|(test, null_generator)| TestEntry {
            test,
            null_generator,
        })
        .collect();
    let alternatives = config.resolve_alternatives(&generators)?;

    let mut experiment = Experiment::new(
        settings,
        test_entries,
        alternatives,
        stores.samples.clone() as Arc<dyn SampleStore>,
        stores.critical_values.clone() as Arc<dyn CriticalValueStore>,
        stores.results.clone() as Arc<dyn ResultStore>,
    );
    experiment.add_observer(Arc::new(LoggingObserver));
    let timer = Arc::new(TimingObserver::new());
    experiment.add_observer(timer.clone());

    let mut builder: Box<dyn ReportBuilder> = match format {
        OutputFormat::Json => Box::new(JsonReportBuilder::new(config.experiment.monte_carlo_count)),
        OutputFormat::Human => Box::new(TextReportBuilder::new()),
    };

    let report = experiment.run(builder.as_mut())?;

    if let Some(state_dir) = &config.experiment.state_dir {
        stores.save(state_dir)?;
    }

    for stage in [Stage::Generation, Stage::Testing, Stage::Reporting] {
        if let Some(duration) = timer.duration(stage) {
            info!(stage = %stage, elapsed = ?duration, "stage timing");
        }
    }

    if let Some(report) = report {
        match &args.output {
            Some(path) => {
                std::fs::write(path, &report)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                info!(report = %path.display(), "report written");
            }
            None => println!("{}", report),
        }
    }
    Ok(())
}

fn print_plan(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let tests = TestRegistry::with_builtins();
    let generators = GeneratorRegistry::with_builtins();
    config.validate(&tests, &generators)?;

    let exp = &config.experiment;
    let generation_items = config.alternatives.len() * exp.sizes.len();
    let testing_items = config.tests.len() * generation_items * exp.alphas.len();

    println!("Experiment plan");
    println!("  tests:        {}", config.tests.len());
    for spec in &config.tests {
        println!("    {} (null: {})", spec.code, spec.null.family);
    }
    println!("  alternatives: {}", config.alternatives.len());
    for spec in &config.alternatives {
        println!("    {} {:?}", spec.family, spec.params);
    }
    println!("  sizes:        {:?}", exp.sizes);
    println!("  alphas:       {:?}", exp.alphas);
    println!(
        "  generation:   {} combination(s), {} sample(s) each",
        generation_items, exp.sample_count
    );
    println!(
        "  testing:      {} combination(s), {} Monte Carlo repetition(s) per calibration",
        testing_items, exp.monte_carlo_count
    );
    println!("  workers:      {}", config.jobs());
    Ok(())
}

fn write_starter_config() -> anyhow::Result<()> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() {
        bail!("{} already exists; refusing to overwrite", path.display());
    }
    std::fs::write(&path, default_toml())?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn clear_samples(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let Some(state_dir) = &config.experiment.state_dir else {
        bail!("Config has no state_dir; in-memory samples vanish on exit and need no clearing");
    };
    let stores = Stores::open(Some(state_dir))?;
    stores.samples.clear_all_rvs()?;
    stores.save(state_dir)?;
    println!("Cleared persisted samples under {}", state_dir.display());
    Ok(())
}
