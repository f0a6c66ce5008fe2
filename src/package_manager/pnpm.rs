//! pnpm adapter
//!
//! `pnpm outdated --format json` prints an object keyed by package name
//! (older releases print a list of named entries) and exits 1 when anything
//! is outdated.

use super::{parse_keyed_report, PackageManager};
use crate::command::CommandLine;
use crate::domain::{OutdatedPackage, PackageManagerKind};

/// pnpm adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct Pnpm;

impl PackageManager for Pnpm {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Pnpm
    }

    fn query_outdated(&self) -> CommandLine {
        CommandLine::new("pnpm").args(["outdated", "--format", "json"])
    }

    /// `pnpm update --latest` keeps the package in its current dependency group
    fn install_latest(&self, package: &str) -> CommandLine {
        CommandLine::new("pnpm").args(["update", package, "--latest"])
    }

    fn parse_outdated(&self, payload: &str) -> Result<Vec<OutdatedPackage>, String> {
        parse_keyed_report(payload)
    }
}
