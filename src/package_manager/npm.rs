//! npm adapter
//!
//! `npm outdated --json` prints an object keyed by package name and exits 1
//! when anything is outdated.

use super::{parse_keyed_report, PackageManager};
use crate::command::CommandLine;
use crate::domain::{OutdatedPackage, PackageManagerKind};

/// npm adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct Npm;

impl PackageManager for Npm {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Npm
    }

    fn query_outdated(&self) -> CommandLine {
        CommandLine::new("npm").args(["outdated", "--json"])
    }

    fn install_latest(&self, package: &str) -> CommandLine {
        CommandLine::new("npm").args(["install".to_string(), format!("{}@latest", package)])
    }

    fn parse_outdated(&self, payload: &str) -> Result<Vec<OutdatedPackage>, String> {
        parse_keyed_report(payload)
    }
}
