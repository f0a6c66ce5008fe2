//! Transaction and session result types
//!
//! Provides structures for tracking each package's transaction and the
//! aggregated session outcome.

use super::PackageManagerKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single package's upgrade transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// Not started yet
    Pending,
    /// Install command running
    Installing,
    /// Check command running against the upgraded tree
    Validating,
    /// Check passed; the upgrade stays in the working tree
    Committed,
    /// Check failed; manifests restored and modules reinstalled
    RevertedOnFailure,
}

impl TransactionState {
    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(self, next: TransactionState) -> bool {
        matches!(
            (self, next),
            (TransactionState::Pending, TransactionState::Installing)
                | (TransactionState::Installing, TransactionState::Validating)
                | (TransactionState::Validating, TransactionState::Committed)
                | (TransactionState::Validating, TransactionState::RevertedOnFailure)
        )
    }

    /// Whether the transaction has finished
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::RevertedOnFailure
        )
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionState::Pending => "pending",
            TransactionState::Installing => "installing",
            TransactionState::Validating => "validating",
            TransactionState::Committed => "committed",
            TransactionState::RevertedOnFailure => "reverted",
        };
        write!(f, "{}", label)
    }
}

/// Final outcome of a package's transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOutcome {
    /// Upgraded and kept
    Committed,
    /// Check failed after install; reverted
    RevertedOnFailure,
}

/// Result of one package's upgrade attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageResult {
    /// Package name
    pub name: String,
    /// Installed version before the attempt, as reported by the package manager
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Version the attempt targeted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    /// Transaction outcome
    pub outcome: TransactionOutcome,
    /// Declared range in package.json before the attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_before: Option<String>,
    /// Declared range in package.json after the attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_after: Option<String>,
    /// Install or cleanup failures encountered along the way
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl PackageResult {
    /// Creates a new PackageResult
    pub fn new(name: impl Into<String>, outcome: TransactionOutcome) -> Self {
        Self {
            name: name.into(),
            current: None,
            latest: None,
            outcome,
            declared_before: None,
            declared_after: None,
            notes: Vec::new(),
        }
    }

    pub fn is_upgraded(&self) -> bool {
        self.outcome == TransactionOutcome::Committed
    }

    pub fn is_reverted(&self) -> bool {
        self.outcome == TransactionOutcome::RevertedOnFailure
    }
}

/// How the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing to upgrade
    UpToDate,
    /// Outdated packages exist but --only/--exclude left none to upgrade
    Filtered,
    /// The operator declined the confirmation prompt
    Declined,
    /// Outdated set listed, nothing touched
    DryRun,
    /// Every package in the outdated set was attempted
    Completed,
}

/// Aggregated outcome of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Package manager the session drove
    pub manager: PackageManagerKind,
    /// How the session ended
    pub status: SessionStatus,
    /// Branch the operator started on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_branch: Option<String>,
    /// Branch holding the upgrades
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_branch: Option<String>,
    /// Packages that were listed but not attempted (dry run or declined)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<String>,
    /// Outdated packages removed by --only/--exclude
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Per-package results in attempt order
    pub packages: Vec<PackageResult>,
    /// Recovered problems worth surfacing
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SessionReport {
    /// Creates a new report with no packages processed
    pub fn new(manager: PackageManagerKind) -> Self {
        Self {
            manager,
            status: SessionStatus::UpToDate,
            original_branch: None,
            work_branch: None,
            pending: Vec::new(),
            skipped: Vec::new(),
            packages: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds a package result
    pub fn add_result(&mut self, result: PackageResult) {
        self.packages.push(result);
    }

    /// Returns the number of committed upgrades
    pub fn upgraded_count(&self) -> usize {
        self.packages.iter().filter(|r| r.is_upgraded()).count()
    }

    /// Returns the number of reverted upgrades
    pub fn reverted_count(&self) -> usize {
        self.packages.iter().filter(|r| r.is_reverted()).count()
    }

    /// Returns all committed upgrades
    pub fn upgraded(&self) -> impl Iterator<Item = &PackageResult> {
        self.packages.iter().filter(|r| r.is_upgraded())
    }

    /// Returns all reverted upgrades
    pub fn reverted(&self) -> impl Iterator<Item = &PackageResult> {
        self.packages.iter().filter(|r| r.is_reverted())
    }
}
