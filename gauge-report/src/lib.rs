#![warn(missing_docs)]
//! Gauge Report - Rendering Finished Runs
//!
//! Generates two output formats:
//! - Human (one `PASS|FAIL` line per benchmark)
//! - JSON (machine-readable)

mod human;
mod json;
mod report;

pub use human::{format_human_output, format_line};
pub use json::generate_json_report;
pub use report::{BenchmarkRecord, Report, ReportMeta, ReportSummary};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable terminal output
    Human,
    /// JSON with full metadata
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a report in the requested format
pub fn render(report: &Report, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Human => Ok(format_human_output(&report.results)),
        OutputFormat::Json => generate_json_report(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("Human".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert_eq!("text".parse::<OutputFormat>(), Ok(OutputFormat::Human));
        assert!("html".parse::<OutputFormat>().is_err());
    }
}
