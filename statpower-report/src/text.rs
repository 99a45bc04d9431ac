//! Human-Readable Output

use crate::builder::{ReportBuilder, ReportError};
use crate::report::ReportSummary;
use statpower_core::PowerResult;

/// Builder rendering a terminal-friendly power table, grouped by test
pub struct TextReportBuilder {
    results: Vec<PowerResult>,
}

impl TextReportBuilder {
    /// New text builder
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl Default for TextReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder for TextReportBuilder {
    fn process(&mut self, result: &PowerResult) -> Result<(), ReportError> {
        self.results.push(result.clone());
        Ok(())
    }

    fn build(&mut self) -> Result<String, ReportError> {
        let results = std::mem::take(&mut self.results);
        let summary = ReportSummary::from_results(&results);

        let mut output = String::new();
        output.push('\n');
        output.push_str("Statpower Results\n");
        output.push_str(&"=".repeat(72));
        output.push('\n');

        if results.is_empty() {
            output.push_str("No results.\n");
            return Ok(output);
        }

        for test in &summary.tests {
            output.push_str(&format!("\ntest: {}\n", test));
            output.push_str(&format!(
                "  {:<24} {:>6} {:>7} {:>8}\n",
                "alternative", "size", "alpha", "power"
            ));
            for r in results.iter().filter(|r| &r.test_code == test) {
                output.push_str(&format!(
                    "  {:<24} {:>6} {:>7} {:>8.4}\n",
                    r.generator_code, r.size, r.alpha, r.power
                ));
            }
        }

        output.push('\n');
        output.push_str("Summary\n");
        output.push_str(&"-".repeat(72));
        output.push('\n');
        output.push_str(&format!(
            "  {} result(s), mean power {:.4}, range [{:.4}, {:.4}]\n",
            summary.total_results, summary.mean_power, summary.min_power, summary.max_power
        ));

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_report_groups_by_test() {
        let mut builder = TextReportBuilder::new();
        for (test, power) in [("ks_norm", 0.9), ("ks_exp", 0.2), ("ks_norm", 1.0)] {
            builder
                .process(&PowerResult {
                    test_code: test.to_string(),
                    generator_code: "uniform_0_1".to_string(),
                    size: 50,
                    alpha: 0.05,
                    power,
                })
                .unwrap();
        }

        let text = builder.build().unwrap();
        assert!(text.contains("test: ks_norm"));
        assert!(text.contains("test: ks_exp"));
        assert!(text.contains("3 result(s)"));
    }

    #[test]
    fn empty_text_report() {
        let mut builder = TextReportBuilder::new();
        let text = builder.build().unwrap();
        assert!(text.contains("No results."));
    }
}
