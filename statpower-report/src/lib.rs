#![warn(missing_docs)]
//! Statpower Report - Power Study Output
//!
//! The reporting stage streams persisted power results into a
//! [`ReportBuilder`], which accumulates them and renders a terminal report:
//! - JSON (machine-readable)
//! - Human-readable text table

mod builder;
mod json;
mod report;
mod text;

pub use builder::{CountingReportBuilder, ReportBuilder, ReportError};
pub use json::JsonReportBuilder;
pub use report::{PowerReport, ReportMeta, ReportSummary};
pub use text::TextReportBuilder;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn format_parsing() {
        assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("TEXT").unwrap(), OutputFormat::Human);
        assert!(OutputFormat::from_str("pdf").is_err());
    }
}
