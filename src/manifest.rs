//! Read-only package.json inspection
//!
//! The upgrade loop never edits the manifest itself; it only reads declared
//! ranges before and after each transaction for reporting.

use crate::error::ManifestError;
use serde_json::Value;
use std::path::Path;

/// The Node.js dependency manifest
pub const MANIFEST_FILENAME: &str = "package.json";

/// Sections searched for a declared range, in lookup order
const DEPENDENCY_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "optionalDependencies",
    "peerDependencies",
];

/// Declared version range of `package` in manifest content
pub fn declared_version_in(content: &str, package: &str) -> Result<Option<String>, ManifestError> {
    let json: Value = serde_json::from_str(content)
        .map_err(|e| ManifestError::json_parse_error(MANIFEST_FILENAME, e.to_string()))?;

    let declared = DEPENDENCY_SECTIONS.iter().find_map(|section| {
        json.get(section)
            .and_then(|deps| deps.get(package))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    Ok(declared)
}

/// Declared version range of `package` in `<root>/package.json`
pub fn declared_version(root: &Path, package: &str) -> Result<Option<String>, ManifestError> {
    let path = root.join(MANIFEST_FILENAME);
    let content =
        std::fs::read_to_string(&path).map_err(|e| ManifestError::read_error(&path, e))?;
    declared_version_in(&content, package).map_err(|e| match e {
        ManifestError::JsonParseError { message, .. } => {
            ManifestError::json_parse_error(&path, message)
        }
        other => other,
    })
}
