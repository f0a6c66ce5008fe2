//! Per-package upgrade transaction
//!
//! Each package goes through install → validate → commit-or-revert:
//!
//! ```text
//! Pending → Installing → Validating → Committed
//!                                   ↘ RevertedOnFailure
//! ```
//!
//! Only the check command decides the outcome. An install that exits
//! non-zero is recorded and validation still runs. Revert always runs both
//! cleanup steps, and their failures are recorded rather than raised.

use crate::command::{CommandLine, CommandRunner};
use crate::domain::{OutdatedPackage, PackageResult, TransactionOutcome, TransactionState};
use crate::manifest;
use crate::operator::Operator;
use crate::package_manager::PackageManager;
use log::{debug, warn};
use std::path::Path;

/// Runs one package's upgrade transaction against the working tree
pub struct UpgradeEngine<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    manager: &'a dyn PackageManager,
    check: &'a CommandLine,
    root: &'a Path,
}

/// State tracker for a single transaction
struct Transaction<'p> {
    package: &'p str,
    state: TransactionState,
}

impl<'p> Transaction<'p> {
    fn new(package: &'p str) -> Self {
        Self {
            package,
            state: TransactionState::Pending,
        }
    }

    fn advance<O: Operator + ?Sized>(&mut self, next: TransactionState, operator: &mut O) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!("{}: {} -> {}", self.package, self.state, next);
        self.state = next;
        operator.package_phase(self.package, next);
    }
}

impl<'a, R: CommandRunner + ?Sized> UpgradeEngine<'a, R> {
    pub fn new(
        runner: &'a R,
        manager: &'a dyn PackageManager,
        check: &'a CommandLine,
        root: &'a Path,
    ) -> Self {
        Self {
            runner,
            manager,
            check,
            root,
        }
    }

    /// Upgrade `package` to its latest version, keeping it only if the
    /// check command passes afterwards.
    pub async fn upgrade<O: Operator + ?Sized>(
        &self,
        package: &OutdatedPackage,
        operator: &mut O,
    ) -> PackageResult {
        let mut transaction = Transaction::new(&package.name);
        let mut notes = Vec::new();
        let declared_before = self.declared(&package.name);

        transaction.advance(TransactionState::Installing, operator);
        let install = self.manager.install_latest(&package.name);
        if let Err(e) = self.runner.capture(&install).await {
            warn!("install of {} failed, validating anyway: {}", package.name, e);
            notes.push(format!("install failed: {}", e));
        }

        transaction.advance(TransactionState::Validating, operator);
        let outcome = match self.runner.stream(self.check).await {
            Ok(_) => {
                transaction.advance(TransactionState::Committed, operator);
                debug!("{} committed", package.name);
                TransactionOutcome::Committed
            }
            Err(e) => {
                debug!("check failed after upgrading {}: {}", package.name, e);
                transaction.advance(TransactionState::RevertedOnFailure, operator);
                self.revert(&package.name, &mut notes).await;
                debug!("{} reverted", package.name);
                TransactionOutcome::RevertedOnFailure
            }
        };
        debug_assert!(transaction.state.is_terminal());

        let mut result = PackageResult::new(package.name.clone(), outcome);
        result.current = package.current.clone();
        result.latest = package.target_version().map(str::to_string);
        result.declared_before = declared_before;
        result.declared_after = self.declared(&package.name);
        result.notes = notes;
        result
    }

    /// Restore manifests then reinstall, both best-effort
    async fn revert(&self, package: &str, notes: &mut Vec<String>) {
        let steps = [
            ("restore", self.manager.restore_manifests()),
            ("reinstall", self.manager.reinstall_all()),
        ];
        for (step, command) in steps {
            if let Err(e) = self.runner.capture(&command).await {
                warn!("{} after {} failed: {}", step, package, e);
                notes.push(format!("{} failed: {}", step, e));
            }
        }
    }

    fn declared(&self, package: &str) -> Option<String> {
        match manifest::declared_version(self.root, package) {
            Ok(version) => version,
            Err(e) => {
                debug!("could not read declared version of {}: {}", package, e);
                None
            }
        }
    }
}
