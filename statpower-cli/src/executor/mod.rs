//! Stage Executors
//!
//! The pieces each pipeline stage is built from: the critical-value
//! calculator, the per-combination power worker, and the stage lifecycle
//! observers. The pipeline module wires them over the stores.

pub mod calculator;
pub mod observer;
pub mod worker;

pub use calculator::{CalculatorError, CriticalValueCalculator};
pub use observer::{LoggingObserver, Stage, StageObserver, TimingObserver};
pub use worker::{PowerCalculationWorker, WorkerError};
