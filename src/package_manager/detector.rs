//! Package manager detection from the lockfile set

use crate::domain::PackageManagerKind;
use crate::error::DetectError;
use std::path::Path;

/// Detect the package manager managing the repository at `root`.
///
/// First match wins in `PackageManagerKind::detection_order()` (yarn, pnpm,
/// npm), so a repository with several stale lockfiles resolves to the same
/// manager every run. No lockfile at all is an error rather than a guess.
pub fn detect(root: &Path) -> Result<PackageManagerKind, DetectError> {
    PackageManagerKind::detection_order()
        .iter()
        .copied()
        .find(|kind| root.join(kind.lockfile_name()).exists())
        .ok_or_else(|| DetectError::no_lockfile(root))
}
