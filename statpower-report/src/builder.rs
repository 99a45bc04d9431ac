//! Report Builder Capability
//!
//! The reporting stage feeds results one at a time through `process` and
//! calls `build` exactly once after the last record, so builders can render
//! arbitrarily large result sets without the stage ever holding them all.

use statpower_core::PowerResult;
use thiserror::Error;

/// Errors from report construction
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report serialization failed
    #[error("Report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Streaming consumer of power results
pub trait ReportBuilder: Send {
    /// Consume one persisted result
    fn process(&mut self, result: &PowerResult) -> Result<(), ReportError>;

    /// Render the final report after all results were processed
    fn build(&mut self) -> Result<String, ReportError>;
}

/// Builder that only counts records; useful as a sink in tests and dry runs
#[derive(Debug, Default)]
pub struct CountingReportBuilder {
    processed: usize,
    built: usize,
}

impl CountingReportBuilder {
    /// New counting builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of results processed so far
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Number of times `build` has been called
    pub fn built(&self) -> usize {
        self.built
    }
}

impl ReportBuilder for CountingReportBuilder {
    fn process(&mut self, _result: &PowerResult) -> Result<(), ReportError> {
        self.processed += 1;
        Ok(())
    }

    fn build(&mut self) -> Result<String, ReportError> {
        self.built += 1;
        Ok(format!("{} result(s)", self.processed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_builder_counts() {
        let result = PowerResult {
            test_code: "t".to_string(),
            generator_code: "g".to_string(),
            size: 10,
            alpha: 0.05,
            power: 0.5,
        };

        let mut builder = CountingReportBuilder::new();
        builder.process(&result).unwrap();
        builder.process(&result).unwrap();

        assert_eq!(builder.build().unwrap(), "2 result(s)");
        assert_eq!(builder.processed(), 2);
        assert_eq!(builder.built(), 1);
    }
}
