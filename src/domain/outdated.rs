//! Outdated package types
//!
//! Only the package name drives the upgrade loop; version fields are carried
//! along for display and reporting.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A dependency the package manager reports as outdated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdatedPackage {
    /// Package name
    pub name: String,
    /// Currently installed version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    /// Highest version satisfying the declared range
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wanted: Option<String>,
    /// Latest published version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

impl OutdatedPackage {
    /// Creates a new OutdatedPackage with no version metadata
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current: None,
            wanted: None,
            latest: None,
        }
    }

    /// Sets the version metadata
    pub fn with_versions(
        mut self,
        current: Option<String>,
        wanted: Option<String>,
        latest: Option<String>,
    ) -> Self {
        self.current = current;
        self.wanted = wanted;
        self.latest = latest;
        self
    }

    /// Version the upgrade is expected to land on
    pub fn target_version(&self) -> Option<&str> {
        self.latest.as_deref().or(self.wanted.as_deref())
    }

    /// Kind of version jump between current and target
    pub fn change(&self) -> VersionChange {
        match (self.current.as_deref(), self.target_version()) {
            (Some(current), Some(target)) => VersionChange::between(current, target),
            _ => VersionChange::Unknown,
        }
    }
}

impl fmt::Display for OutdatedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.current.as_deref(), self.target_version()) {
            (Some(current), Some(target)) => write!(f, "{} {} -> {}", self.name, current, target),
            (None, Some(target)) => write!(f, "{} -> {}", self.name, target),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// Semantic version change type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionChange {
    /// Major version change (breaking)
    Major,
    /// Minor version change (features)
    Minor,
    /// Patch version change (fixes)
    Patch,
    /// Unknown or unparseable
    Unknown,
}

impl VersionChange {
    /// Determine the change type between two versions
    pub fn between(old: &str, new: &str) -> Self {
        match (lenient_version(old), lenient_version(new)) {
            (Some(old), Some(new)) => {
                if new.major != old.major {
                    VersionChange::Major
                } else if new.minor != old.minor {
                    VersionChange::Minor
                } else {
                    VersionChange::Patch
                }
            }
            _ => VersionChange::Unknown,
        }
    }

    /// Get the plain label
    pub fn label(&self) -> &'static str {
        match self {
            VersionChange::Major => "major",
            VersionChange::Minor => "minor",
            VersionChange::Patch => "patch",
            VersionChange::Unknown => "?",
        }
    }
}

/// Parses "1", "1.2", "v1.2.3" and full semver strings
fn lenient_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    let core_len = raw.find(['-', '+']).unwrap_or(raw.len());
    let padding = match raw[..core_len].split('.').count() {
        1 => ".0.0",
        2 => ".0",
        _ => "",
    };
    let padded = format!("{}{}{}", &raw[..core_len], padding, &raw[core_len..]);
    Version::parse(&padded).ok()
}

/// Ordered outdated packages from a single query
///
/// Order is the order the package manager reported and determines the
/// upgrade attempt order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutdatedSet {
    packages: Vec<OutdatedPackage>,
}

impl OutdatedSet {
    /// Creates a new OutdatedSet
    pub fn new(packages: Vec<OutdatedPackage>) -> Self {
        Self { packages }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutdatedPackage> {
        self.packages.iter()
    }

    /// Returns package names in attempt order
    pub fn names(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.name.as_str()).collect()
    }

    /// Applies --only / --exclude filters, keeping the original order.
    ///
    /// A non-empty `only` list wins over `exclude`.
    pub fn filtered(self, only: &[String], exclude: &[String]) -> Self {
        let packages = self
            .packages
            .into_iter()
            .filter(|p| {
                if !only.is_empty() {
                    return only.iter().any(|name| name == &p.name);
                }
                !exclude.iter().any(|name| name == &p.name)
            })
            .collect();
        Self { packages }
    }
}

impl<'a> IntoIterator for &'a OutdatedSet {
    type Item = &'a OutdatedPackage;
    type IntoIter = std::slice::Iter<'a, OutdatedPackage>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}
