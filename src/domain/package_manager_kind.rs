//! Package manager identities supported by the upgrade loop

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported Node.js package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManagerKind {
    /// npm (package-lock.json)
    Npm,
    /// Yarn classic (yarn.lock)
    Yarn,
    /// pnpm (pnpm-lock.yaml)
    Pnpm,
}

impl PackageManagerKind {
    /// Returns the lockfile that identifies this package manager
    pub fn lockfile_name(&self) -> &'static str {
        match self {
            PackageManagerKind::Npm => "package-lock.json",
            PackageManagerKind::Yarn => "yarn.lock",
            PackageManagerKind::Pnpm => "pnpm-lock.yaml",
        }
    }

    /// Returns the executable name
    pub fn binary(&self) -> &'static str {
        match self {
            PackageManagerKind::Npm => "npm",
            PackageManagerKind::Yarn => "yarn",
            PackageManagerKind::Pnpm => "pnpm",
        }
    }

    /// Returns all package managers in detection precedence order.
    ///
    /// Repositories carrying several lockfiles always resolve to the first
    /// match, so this order must stay yarn, pnpm, npm.
    pub fn detection_order() -> &'static [PackageManagerKind] {
        &[
            PackageManagerKind::Yarn,
            PackageManagerKind::Pnpm,
            PackageManagerKind::Npm,
        ]
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.binary())
    }
}
