//! Stage Lifecycle Observers
//!
//! Hooks fired once before and once after each pipeline stage that actually
//! runs. Skipped stages fire nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

/// The three pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Sample generation and persistence
    Generation,
    /// Power evaluation over persisted samples
    Testing,
    /// Streaming persisted results into a report builder
    Reporting,
}

impl Stage {
    /// Lowercase stage name for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Generation => "generation",
            Stage::Testing => "testing",
            Stage::Reporting => "reporting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Observer of stage boundaries
pub trait StageObserver: Send + Sync {
    /// Called once immediately before the stage body runs
    fn before(&self, stage: Stage);

    /// Called once after the stage body completed successfully
    fn after(&self, stage: Stage);
}

/// Observer that logs stage boundaries through tracing
pub struct LoggingObserver;

impl StageObserver for LoggingObserver {
    fn before(&self, stage: Stage) {
        info!(stage = %stage, "stage starting");
    }

    fn after(&self, stage: Stage) {
        info!(stage = %stage, "stage finished");
    }
}

/// Observer recording wall-clock duration per stage
#[derive(Default)]
pub struct TimingObserver {
    starts: Mutex<HashMap<Stage, Instant>>,
    durations: Mutex<HashMap<Stage, Duration>>,
}

impl TimingObserver {
    /// Fresh timer with no recorded stages
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded duration for `stage`, if it ran to completion
    pub fn duration(&self, stage: Stage) -> Option<Duration> {
        self.durations
            .lock()
            .ok()
            .and_then(|d| d.get(&stage).copied())
    }
}

impl StageObserver for TimingObserver {
    fn before(&self, stage: Stage) {
        if let Ok(mut starts) = self.starts.lock() {
            starts.insert(stage, Instant::now());
        }
    }

    fn after(&self, stage: Stage) {
        let started = self
            .starts
            .lock()
            .ok()
            .and_then(|mut s| s.remove(&stage));
        if let (Some(started), Ok(mut durations)) = (started, self.durations.lock()) {
            durations.insert(stage, started.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_observer_records_completed_stages() {
        let observer = TimingObserver::new();
        observer.before(Stage::Generation);
        observer.after(Stage::Generation);

        assert!(observer.duration(Stage::Generation).is_some());
        assert!(observer.duration(Stage::Testing).is_none());
    }

    #[test]
    fn after_without_before_records_nothing() {
        let observer = TimingObserver::new();
        observer.after(Stage::Reporting);
        assert!(observer.duration(Stage::Reporting).is_none());
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Generation.name(), "generation");
        assert_eq!(Stage::Testing.to_string(), "testing");
    }
}
