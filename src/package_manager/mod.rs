//! Package manager adapters
//!
//! This module provides:
//! - Detection of the package manager from the lockfile set
//! - One adapter per package manager exposing the four operations the
//!   upgrade loop needs, plus parsing of that manager's outdated report
//!
//! Nothing outside this module knows manager-specific command syntax or
//! output formats.

mod detector;
mod npm;
mod pnpm;
mod yarn;

pub use detector::detect;
pub use npm::Npm;
pub use pnpm::Pnpm;
pub use yarn::Yarn;

use crate::command::CommandLine;
use crate::domain::{OutdatedPackage, PackageManagerKind};
use crate::manifest::MANIFEST_FILENAME;
use serde::Deserialize;
use serde_json::Value;

/// Operations the upgrade loop needs from a package manager
pub trait PackageManager: Send + Sync {
    /// Which package manager this adapter drives
    fn kind(&self) -> PackageManagerKind;

    /// Command listing outdated dependencies as structured output
    fn query_outdated(&self) -> CommandLine;

    /// Command upgrading exactly one package to its latest version
    fn install_latest(&self, package: &str) -> CommandLine;

    /// Command discarding uncommitted changes to the manifest and lockfile
    fn restore_manifests(&self) -> CommandLine {
        CommandLine::new("git").args(["restore", MANIFEST_FILENAME, self.kind().lockfile_name()])
    }

    /// Command re-syncing node_modules with the manifest and lockfile
    fn reinstall_all(&self) -> CommandLine {
        CommandLine::new(self.kind().binary()).arg("install")
    }

    /// Parse the payload produced by `query_outdated`
    fn parse_outdated(&self, payload: &str) -> Result<Vec<OutdatedPackage>, String>;
}

/// Get the adapter for a package manager
pub fn profile(kind: PackageManagerKind) -> Box<dyn PackageManager> {
    match kind {
        PackageManagerKind::Npm => Box::new(Npm),
        PackageManagerKind::Yarn => Box::new(Yarn),
        PackageManagerKind::Pnpm => Box::new(Pnpm),
    }
}

/// Version columns shared by the npm and pnpm reports
#[derive(Debug, Deserialize)]
struct OutdatedEntry {
    current: Option<String>,
    wanted: Option<String>,
    latest: Option<String>,
}

/// npm reports one entry per package, or a list of them in workspaces
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(OutdatedEntry),
    Many(Vec<OutdatedEntry>),
}

#[derive(Debug, Deserialize)]
struct NamedOutdatedEntry {
    name: String,
    #[serde(flatten)]
    entry: OutdatedEntry,
}

impl OutdatedEntry {
    fn into_package(self, name: impl Into<String>) -> OutdatedPackage {
        OutdatedPackage::new(name).with_versions(self.current, self.wanted, self.latest)
    }
}

/// Parse a report keyed by package name, or a list of named entries.
///
/// Object key order is preserved so the outdated set follows the order the
/// package manager printed.
fn parse_keyed_report(payload: &str) -> Result<Vec<OutdatedPackage>, String> {
    let json: Value = serde_json::from_str(payload).map_err(|e| e.to_string())?;

    match json {
        Value::Object(map) => {
            if let Some(message) = reported_error(&map) {
                return Err(message);
            }
            let mut packages = Vec::with_capacity(map.len());
            for (name, value) in map {
                let entry: OneOrMany = serde_json::from_value(value)
                    .map_err(|e| format!("entry for '{}': {}", name, e))?;
                let entry = match entry {
                    OneOrMany::One(entry) => entry,
                    OneOrMany::Many(entries) => match entries.into_iter().next() {
                        Some(entry) => entry,
                        None => continue,
                    },
                };
                packages.push(entry.into_package(name));
            }
            Ok(packages)
        }
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value::<NamedOutdatedEntry>(item)
                    .map(|named| named.entry.into_package(named.name))
                    .map_err(|e| e.to_string())
            })
            .collect(),
        other => Err(format!("expected a JSON object or array, found {}", kind_of(&other))),
    }
}

/// npm and pnpm print `{"error": {"code": ..., "summary": ...}}` on failure
fn reported_error(map: &serde_json::Map<String, Value>) -> Option<String> {
    let error = map.get("error")?.as_object()?;
    if !error.contains_key("code") && !error.contains_key("summary") {
        return None;
    }
    let summary = error
        .get("summary")
        .and_then(Value::as_str)
        .or_else(|| error.get("code").and_then(Value::as_str))
        .unwrap_or("unknown error");
    Some(format!("package manager reported an error: {}", summary))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_kinds() {
        for kind in PackageManagerKind::detection_order() {
            assert_eq!(profile(*kind).kind(), *kind);
        }
    }

    #[test]
    fn test_restore_manifests_targets_manager_lockfile() {
        assert_eq!(
            profile(PackageManagerKind::Npm).restore_manifests().to_string(),
            "git restore package.json package-lock.json"
        );
        assert_eq!(
            profile(PackageManagerKind::Yarn).restore_manifests().to_string(),
            "git restore package.json yarn.lock"
        );
        assert_eq!(
            profile(PackageManagerKind::Pnpm).restore_manifests().to_string(),
            "git restore package.json pnpm-lock.yaml"
        );
    }

    #[test]
    fn test_reinstall_all() {
        assert_eq!(profile(PackageManagerKind::Npm).reinstall_all().to_string(), "npm install");
        assert_eq!(profile(PackageManagerKind::Yarn).reinstall_all().to_string(), "yarn install");
        assert_eq!(profile(PackageManagerKind::Pnpm).reinstall_all().to_string(), "pnpm install");
    }

    #[test]
    fn test_keyed_report_preserves_order() {
        let payload = r#"{
            "zod": {"current": "3.22.0", "wanted": "3.22.4", "latest": "3.23.8"},
            "axios": {"current": "1.6.0", "wanted": "1.6.8", "latest": "1.7.2"}
        }"#;
        let packages = parse_keyed_report(payload).unwrap();
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zod", "axios"]);
        assert_eq!(packages[1].latest.as_deref(), Some("1.7.2"));
    }

    #[test]
    fn test_keyed_report_workspace_arrays() {
        let payload = r#"{"lodash": [
            {"current": "4.17.20", "wanted": "4.17.21", "latest": "4.17.21", "dependent": "a"},
            {"current": "4.17.19", "wanted": "4.17.21", "latest": "4.17.21", "dependent": "b"}
        ]}"#;
        let packages = parse_keyed_report(payload).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].current.as_deref(), Some("4.17.20"));
    }

    #[test]
    fn test_keyed_report_array_form() {
        let payload = r#"[{"name": "chalk", "current": "4.1.0", "latest": "5.3.0"}]"#;
        let packages = parse_keyed_report(payload).unwrap();
        assert_eq!(packages[0].name, "chalk");
        assert_eq!(packages[0].wanted, None);
    }

    #[test]
    fn test_keyed_report_missing_current() {
        let payload = r#"{"left-pad": {"wanted": "1.3.0", "latest": "1.3.0"}}"#;
        let packages = parse_keyed_report(payload).unwrap();
        assert_eq!(packages[0].current, None);
    }

    #[test]
    fn test_keyed_report_error_object() {
        let payload = r#"{"error": {"code": "E404", "summary": "Not found"}}"#;
        let err = parse_keyed_report(payload).unwrap_err();
        assert!(err.contains("Not found"));
    }

    #[test]
    fn test_keyed_report_rejects_scalars() {
        let err = parse_keyed_report("42").unwrap_err();
        assert!(err.contains("a number"));
    }

    #[test]
    fn test_keyed_report_invalid_json() {
        assert!(parse_keyed_report("{\"lodash\": ").is_err());
    }
}
