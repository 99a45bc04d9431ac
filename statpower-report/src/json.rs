//! JSON Output

use crate::builder::{ReportBuilder, ReportError};
use crate::report::{PowerReport, ReportMeta, ReportSummary};
use statpower_core::PowerResult;

/// Builder rendering the full report as prettified JSON
pub struct JsonReportBuilder {
    monte_carlo_count: usize,
    results: Vec<PowerResult>,
}

impl JsonReportBuilder {
    /// New JSON builder; `monte_carlo_count` is echoed into the metadata
    pub fn new(monte_carlo_count: usize) -> Self {
        Self {
            monte_carlo_count,
            results: Vec::new(),
        }
    }
}

impl ReportBuilder for JsonReportBuilder {
    fn process(&mut self, result: &PowerResult) -> Result<(), ReportError> {
        self.results.push(result.clone());
        Ok(())
    }

    fn build(&mut self) -> Result<String, ReportError> {
        let results = std::mem::take(&mut self.results);
        let report = PowerReport {
            meta: ReportMeta::now(self.monte_carlo_count),
            summary: ReportSummary::from_results(&results),
            results,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}
