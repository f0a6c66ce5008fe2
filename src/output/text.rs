//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Per-package outcome lines with declared ranges before and after
//! - Semantic version change type indication (major/minor/patch)
//! - Branch hand-off summary

use crate::domain::{PackageResult, SessionReport, SessionStatus, VersionChange};
use crate::output::{OutputFormatter, Verbosity};
use colored::Colorize;
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn paint(&self, text: &str, style: fn(&str) -> colored::ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Declared range change, e.g. `^4.17.20 -> ^4.17.21`
    fn declared_change(result: &PackageResult) -> Option<String> {
        match (&result.declared_before, &result.declared_after) {
            (Some(before), Some(after)) if before != after => {
                Some(format!("{} -> {}", before, after))
            }
            (Some(before), Some(_)) => Some(before.clone()),
            (Some(before), None) => Some(before.clone()),
            (None, Some(after)) => Some(after.clone()),
            (None, None) => None,
        }
    }

    fn change_of(result: &PackageResult) -> VersionChange {
        match (result.current.as_deref(), result.latest.as_deref()) {
            (Some(current), Some(latest)) => VersionChange::between(current, latest),
            _ => VersionChange::Unknown,
        }
    }

    /// Calculate the maximum package name length for alignment
    fn max_name_length(results: &[PackageResult]) -> usize {
        results.iter().map(|r| r.name.len()).max().unwrap_or(0)
    }

    /// Format a single package line
    fn format_package_line(
        &self,
        result: &PackageResult,
        max_name_len: usize,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let (mark, verb) = if result.is_upgraded() {
            (self.paint("✔", |s| s.green()), "upgraded")
        } else {
            (self.paint("✖", |s| s.red()), "reverted")
        };
        let name = format!("{:width$}", result.name, width = max_name_len);
        let declared = Self::declared_change(result)
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        let change = Self::change_of(result);

        writeln!(
            writer,
            "  {} {} {} [{}]{}",
            mark,
            name,
            verb,
            change.label(),
            self.paint(&declared, |s| s.dimmed())
        )?;

        if self.verbosity == Verbosity::Verbose {
            for note in &result.notes {
                writeln!(writer, "      {}", self.paint(note, |s| s.dimmed()))?;
            }
        }
        Ok(())
    }

    fn format_warnings(&self, report: &SessionReport, writer: &mut dyn Write) -> std::io::Result<()> {
        for warning in &report.warnings {
            writeln!(writer, "{} {}", self.paint("Warning:", |s| s.yellow()), warning)?;
        }
        Ok(())
    }

    fn format_quiet(&self, report: &SessionReport, writer: &mut dyn Write) -> std::io::Result<()> {
        match report.status {
            SessionStatus::UpToDate => writeln!(writer, "Up to date"),
            SessionStatus::Filtered => {
                writeln!(writer, "Nothing selected ({} skipped)", report.skipped.len())
            }
            SessionStatus::Declined => writeln!(writer, "Aborted"),
            SessionStatus::DryRun => {
                writeln!(writer, "(dry-run) {} outdated", report.pending.len())
            }
            SessionStatus::Completed => writeln!(
                writer,
                "{} upgraded, {} reverted",
                report.upgraded_count(),
                report.reverted_count()
            ),
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, report: &SessionReport, writer: &mut dyn Write) -> std::io::Result<()> {
        // In quiet mode, only show one line
        if self.verbosity == Verbosity::Quiet {
            return self.format_quiet(report, writer);
        }

        self.format_warnings(report, writer)?;

        match report.status {
            SessionStatus::UpToDate => {
                writeln!(
                    writer,
                    "{}",
                    self.paint("All dependencies are up to date.", |s| s.green())
                )?;
            }
            SessionStatus::Filtered => {
                writeln!(
                    writer,
                    "{}",
                    self.paint(
                        "No outdated package matched --only/--exclude; nothing upgraded.",
                        |s| s.yellow()
                    )
                )?;
                writeln!(writer, "Skipped: {}", report.skipped.join(", "))?;
            }
            SessionStatus::Declined => {
                writeln!(writer, "{}", self.paint("Update process aborted.", |s| s.blue()))?;
            }
            SessionStatus::DryRun => {
                writeln!(
                    writer,
                    "{} {} package(s) would be upgraded with {}:",
                    self.paint("(dry-run)", |s| s.cyan()),
                    report.pending.len(),
                    report.manager
                )?;
                for name in &report.pending {
                    writeln!(writer, "  - {}", name)?;
                }
            }
            SessionStatus::Completed => {
                writeln!(writer, "{}", self.paint("Finished attempting updates.", |s| s.green()))?;
                let max_name_len = Self::max_name_length(&report.packages);
                for result in &report.packages {
                    self.format_package_line(result, max_name_len, writer)?;
                }
                writeln!(writer)?;
                writeln!(
                    writer,
                    "Summary: {} upgraded, {} reverted",
                    self.paint(&report.upgraded_count().to_string(), |s| s.green()),
                    self.paint(&report.reverted_count().to_string(), |s| s.red())
                )?;
                if let (Some(work), Some(original)) =
                    (&report.work_branch, &report.original_branch)
                {
                    let line = format!("You're now on branch {} (you were on {})", work, original);
                    writeln!(writer, "{}", self.paint(&line, |s| s.blue()))?;
                }
                writeln!(
                    writer,
                    "{}",
                    self.paint("Review changes and merge if satisfied.", |s| s.yellow())
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PackageManagerKind, TransactionOutcome};

    fn package(
        name: &str,
        outcome: TransactionOutcome,
        current: &str,
        latest: &str,
        before: &str,
        after: &str,
    ) -> PackageResult {
        let mut result = PackageResult::new(name, outcome);
        result.current = Some(current.to_string());
        result.latest = Some(latest.to_string());
        result.declared_before = Some(before.to_string());
        result.declared_after = Some(after.to_string());
        result
    }

    fn completed_report() -> SessionReport {
        let mut report = SessionReport::new(PackageManagerKind::Npm);
        report.status = SessionStatus::Completed;
        report.original_branch = Some("main".to_string());
        report.work_branch = Some("update-deps-1700000000000".to_string());
        report.add_result(package(
            "lodash",
            TransactionOutcome::Committed,
            "4.17.20",
            "4.17.21",
            "^4.17.20",
            "^4.17.21",
        ));
        let mut chalk = package(
            "chalk",
            TransactionOutcome::RevertedOnFailure,
            "4.1.2",
            "5.3.0",
            "^4.1.2",
            "^4.1.2",
        );
        chalk.notes.push("reinstall failed: exited with status 1".to_string());
        report.add_result(chalk);
        report
    }

    fn render(formatter: TextFormatter, report: &SessionReport) -> String {
        let mut output = Vec::new();
        formatter.format(report, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_format_completed() {
        let output = render(
            TextFormatter::with_color(Verbosity::Normal, false),
            &completed_report(),
        );

        assert!(output.contains("Finished attempting updates."));
        assert!(output.contains("lodash upgraded [patch] (^4.17.20 -> ^4.17.21)"));
        assert!(output.contains("chalk  reverted [major] (^4.1.2)"));
        assert!(output.contains("Summary: 1 upgraded, 1 reverted"));
        assert!(output.contains("You're now on branch update-deps-1700000000000 (you were on main)"));
        assert!(output.contains("Review changes and merge if satisfied."));
        assert!(!output.contains("reinstall failed"));
    }

    #[test]
    fn test_format_verbose_shows_notes() {
        let output = render(
            TextFormatter::with_color(Verbosity::Verbose, false),
            &completed_report(),
        );
        assert!(output.contains("reinstall failed"));
    }

    #[test]
    fn test_format_quiet() {
        let output = render(
            TextFormatter::with_color(Verbosity::Quiet, false),
            &completed_report(),
        );
        assert_eq!(output, "1 upgraded, 1 reverted\n");
    }

    #[test]
    fn test_format_up_to_date_with_warning() {
        let mut report = SessionReport::new(PackageManagerKind::Yarn);
        report
            .warnings
            .push("malformed JSON in yarn outdated output: EOF".to_string());
        let output = render(TextFormatter::with_color(Verbosity::Normal, false), &report);

        assert!(output.contains("Warning: malformed JSON"));
        assert!(output.contains("All dependencies are up to date."));
    }

    #[test]
    fn test_format_filtered_is_not_up_to_date() {
        let mut report = SessionReport::new(PackageManagerKind::Npm);
        report.status = SessionStatus::Filtered;
        report.skipped = vec!["lodash".to_string(), "chalk".to_string()];

        let output = render(TextFormatter::with_color(Verbosity::Normal, false), &report);
        assert!(!output.contains("up to date"));
        assert!(output.contains("nothing upgraded"));
        assert!(output.contains("Skipped: lodash, chalk"));

        let quiet = render(TextFormatter::with_color(Verbosity::Quiet, false), &report);
        assert_eq!(quiet, "Nothing selected (2 skipped)\n");
    }

    #[test]
    fn test_format_declined() {
        let mut report = SessionReport::new(PackageManagerKind::Npm);
        report.status = SessionStatus::Declined;
        let output = render(TextFormatter::with_color(Verbosity::Normal, false), &report);
        assert!(output.contains("Update process aborted."));
    }

    #[test]
    fn test_format_dry_run() {
        let mut report = SessionReport::new(PackageManagerKind::Pnpm);
        report.status = SessionStatus::DryRun;
        report.pending = vec!["lodash".to_string(), "chalk".to_string()];
        let output = render(TextFormatter::with_color(Verbosity::Normal, false), &report);

        assert!(output.contains("(dry-run) 2 package(s) would be upgraded with pnpm:"));
        assert!(output.contains("  - lodash\n  - chalk\n"));
    }

    #[test]
    fn test_declared_change_unchanged_shows_single_range() {
        let result = package(
            "chalk",
            TransactionOutcome::RevertedOnFailure,
            "4.1.2",
            "5.3.0",
            "^4.1.2",
            "^4.1.2",
        );
        assert_eq!(TextFormatter::declared_change(&result).as_deref(), Some("^4.1.2"));
    }

    #[test]
    fn test_colored_output_contains_names() {
        let output = render(TextFormatter::new(Verbosity::Normal), &completed_report());
        assert!(output.contains("lodash"));
        assert!(output.contains("chalk"));
    }
}
