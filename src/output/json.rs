//! JSON output formatter for machine processing
//!
//! This module provides:
//! - JSON serialization of the session report
//! - Aggregate counts alongside the per-package results

use crate::domain::{PackageResult, SessionReport};
use crate::output::{OutputFormatter, Verbosity};
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    /// Verbosity level affects detail in output
    verbosity: Verbosity,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }
}

/// JSON representation of the full report
#[derive(Serialize)]
struct JsonOutput<'a> {
    /// The report itself
    #[serde(flatten)]
    report: &'a SessionReport,
    /// Summary statistics
    summary: JsonSummary,
}

/// JSON representation of summary statistics
#[derive(Serialize)]
struct JsonSummary {
    /// Committed upgrades
    upgraded: usize,
    /// Reverted upgrades
    reverted: usize,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &SessionReport, writer: &mut dyn Write) -> std::io::Result<()> {
        // Notes are diagnostic detail; drop them unless verbose
        let trimmed;
        let report = if self.verbosity == Verbosity::Verbose {
            report
        } else {
            let mut copy = report.clone();
            copy.packages = copy
                .packages
                .into_iter()
                .map(|p| PackageResult {
                    notes: Vec::new(),
                    ..p
                })
                .collect();
            trimmed = copy;
            &trimmed
        };

        let output = JsonOutput {
            report,
            summary: JsonSummary {
                upgraded: report.upgraded_count(),
                reverted: report.reverted_count(),
            },
        };

        let json = serde_json::to_string_pretty(&output).map_err(std::io::Error::other)?;

        writeln!(writer, "{}", json)?;

        Ok(())
    }
}
