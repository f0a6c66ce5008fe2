//! Operator interaction
//!
//! The session reports progress and asks for confirmation through the
//! `Operator` trait. `TerminalOperator` renders spinners, coloured status
//! lines and an interactive prompt; everything it prints goes to stderr so
//! stdout carries only the final summary.

use crate::command::CommandLine;
use crate::domain::{
    OutdatedPackage, OutdatedSet, PackageManagerKind, PackageResult, TransactionState,
    VersionChange,
};
use crate::error::{OutdatedError, SessionError};
use crate::progress::Progress;
use colored::Colorize;
use inquire::{Confirm, InquireError};

/// Feedback and confirmation boundary used by the session
pub trait Operator {
    /// The baseline check is about to run
    fn baseline_started(&mut self, check: &CommandLine);

    /// The baseline check finished
    fn baseline_finished(&mut self, passed: bool, check: &CommandLine);

    /// The outdated query is about to run
    fn outdated_started(&mut self, manager: PackageManagerKind);

    /// The outdated query finished
    fn outdated_finished(&mut self, outcome: Result<&OutdatedSet, &OutdatedError>);

    /// Show the packages that are about to be upgraded
    fn present(&mut self, outdated: &OutdatedSet);

    /// Ask whether to proceed; `false` aborts with no side effects
    fn confirm(&mut self, outdated: &OutdatedSet) -> Result<bool, SessionError>;

    /// The work branch was created and checked out
    fn branch_created(&mut self, work_branch: &str, original_branch: &str);

    /// A package's transaction is starting (`index` is 1-based)
    fn package_started(&mut self, index: usize, total: usize, package: &OutdatedPackage);

    /// A package's transaction entered a new state
    fn package_phase(&mut self, package: &str, state: TransactionState);

    /// A package's transaction finished
    fn package_finished(&mut self, result: &PackageResult);

    /// An informational line
    fn notice(&mut self, message: &str);

    /// A recovered problem worth the operator's attention
    fn warning(&mut self, message: &str);
}

/// Operator backed by the terminal
pub struct TerminalOperator {
    progress: Progress,
    quiet: bool,
    /// Zero-based position and total of the package being upgraded
    slot: (u64, u64),
}

impl TerminalOperator {
    /// Create a terminal operator; quiet mode disables spinners and chatter
    pub fn new(quiet: bool) -> Self {
        Self {
            progress: Progress::new(!quiet),
            quiet,
            slot: (0, 0),
        }
    }

    fn line(&mut self, message: String) {
        if !self.quiet {
            self.progress.println(&message);
        }
    }

    fn change_label(change: VersionChange) -> String {
        match change {
            VersionChange::Major => "major".red().bold().to_string(),
            VersionChange::Minor => "minor".yellow().to_string(),
            VersionChange::Patch => "patch".green().to_string(),
            VersionChange::Unknown => "?".dimmed().to_string(),
        }
    }
}

impl Operator for TerminalOperator {
    fn baseline_started(&mut self, check: &CommandLine) {
        self.line(format!(
            "{} Running initial checks ({})...",
            "●".cyan(),
            check.to_string().dimmed()
        ));
    }

    fn baseline_finished(&mut self, passed: bool, check: &CommandLine) {
        if passed {
            self.line(format!("{} Initial checks passed.", "✔".green()));
            return;
        }

        // Shown even in quiet mode.
        eprintln!("{} Initial checks failed. Aborting.", "✖".red());
        eprintln!();
        eprintln!("Please ensure your checks pass before proceeding with updates.");
        eprintln!();
        eprintln!("The check command was:");
        eprintln!("  {}", check.to_string().dimmed());
        eprintln!();
        eprintln!("You can change this by passing a command as an argument.");
        eprintln!("Example:");
        eprintln!("  {}", "$ autoupgrade 'npm test'".dimmed());
    }

    fn outdated_started(&mut self, manager: PackageManagerKind) {
        self.progress
            .spinner(&format!("Checking for outdated packages ({})...", manager));
    }

    fn outdated_finished(&mut self, outcome: Result<&OutdatedSet, &OutdatedError>) {
        self.progress.finish_and_clear();
        match outcome {
            Ok(_) => self.line(format!("{} Outdated packages retrieved.", "✔".green())),
            Err(OutdatedError::Malformed { .. }) => {
                self.line(format!(
                    "{} Malformed outdated output; treating as nothing to upgrade.",
                    "!".yellow()
                ));
            }
            Err(OutdatedError::QueryFailed { .. }) => {
                eprintln!("{} Failed to retrieve outdated packages.", "✖".red());
            }
        }
    }

    fn present(&mut self, outdated: &OutdatedSet) {
        if self.quiet {
            return;
        }
        eprintln!(
            "{}",
            format!("Found {} outdated packages.", outdated.len()).yellow()
        );
        eprintln!("{}", "Outdated packages:".blue());
        for package in outdated {
            eprintln!("- {} ({})", package, Self::change_label(package.change()));
        }
    }

    fn confirm(&mut self, _outdated: &OutdatedSet) -> Result<bool, SessionError> {
        confirmation_answer(
            Confirm::new("Do you want to proceed with updating these packages?")
                .with_default(true)
                .prompt(),
        )
    }

    fn branch_created(&mut self, work_branch: &str, _original_branch: &str) {
        self.line(format!(
            "{}",
            format!("Switched to new branch: {}", work_branch).green()
        ));
    }

    fn package_started(&mut self, index: usize, total: usize, package: &OutdatedPackage) {
        self.slot = (index.saturating_sub(1) as u64, total as u64);
        self.line(format!(
            "{} {}",
            format!("[{}/{}]", index, total).dimmed(),
            package.to_string().bold()
        ));
    }

    fn package_phase(&mut self, package: &str, state: TransactionState) {
        match state {
            TransactionState::Installing => {
                let (position, total) = self.slot;
                self.progress
                    .start(total, position, &format!("Updating {}...", package));
            }
            TransactionState::Validating => {
                // Check output streams to the terminal; no spinner over it.
                self.progress.finish_and_clear();
                self.line(format!("  Running checks for {}...", package));
            }
            TransactionState::RevertedOnFailure => {
                let (position, total) = self.slot;
                self.progress.start(
                    total,
                    position,
                    &format!("{} failed checks, reverting...", package),
                );
            }
            TransactionState::Pending | TransactionState::Committed => {}
        }
    }

    fn package_finished(&mut self, result: &PackageResult) {
        self.progress.finish_and_clear();
        if result.is_upgraded() {
            self.line(format!("  {} {} updated successfully", "✔".green(), result.name));
        } else {
            self.line(format!("  {} {} failed checks, reverted", "✖".red(), result.name));
        }
        for note in &result.notes {
            self.line(format!("    {}", note.dimmed()));
        }
    }

    fn notice(&mut self, message: &str) {
        self.line(message.to_string());
    }

    fn warning(&mut self, message: &str) {
        self.progress.finish_and_clear();
        eprintln!("{} {}", "!".yellow(), message);
    }
}

/// Esc and Ctrl-C at the prompt count as declining
fn confirmation_answer(answer: Result<bool, InquireError>) -> Result<bool, SessionError> {
    match answer {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(e) => Err(SessionError::Prompt {
            message: e.to_string(),
        }),
    }
}
