//! Core domain models for autoupgrade
//!
//! This module contains the fundamental types used throughout the application:
//! - Package manager identity detected for a session
//! - Outdated packages and the ordered outdated set
//! - Per-package transaction states and outcomes
//! - The aggregated session report

mod outdated;
mod package_manager_kind;
mod report;

pub use outdated::{OutdatedPackage, OutdatedSet, VersionChange};
pub use package_manager_kind::PackageManagerKind;
pub use report::{PackageResult, SessionReport, SessionStatus, TransactionOutcome, TransactionState};
