//! Session controller coordinating the whole upgrade workflow
//!
//! This module provides:
//! - Workflow coordination: baseline → resolve → confirm → branch → upgrade
//! - Package filters (--only / --exclude)
//! - Dry-run mode support
//!
//! Packages are upgraded strictly one after another: every transaction
//! mutates the same manifest, lockfile and module tree.

use crate::cli::CliArgs;
use crate::command::{CommandLine, CommandRunner};
use crate::domain::{OutdatedSet, SessionReport, SessionStatus};
use crate::error::{CommandError, SessionError};
use crate::operator::Operator;
use crate::outdated;
use crate::package_manager::PackageManager;
use crate::transaction::UpgradeEngine;
use crate::vcs::{work_branch_name, Git};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::path::PathBuf;

/// Check command used when none is given
pub const DEFAULT_CHECK_COMMAND: &str = "npm test";

/// Everything a session needs to know up front
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Repository root
    pub root: PathBuf,
    /// Command that must pass before and after each upgrade
    pub check_command: CommandLine,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
    /// Stop after presenting the outdated set
    pub dry_run: bool,
    /// Restrict upgrades to these packages
    pub only: Vec<String>,
    /// Never upgrade these packages
    pub exclude: Vec<String>,
}

impl SessionConfig {
    /// Creates a config for `root`; every switch starts off
    pub fn new(root: impl Into<PathBuf>, check_command: CommandLine) -> Self {
        Self {
            root: root.into(),
            check_command,
            assume_yes: false,
            dry_run: false,
            only: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn only(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    pub fn exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Build the config from parsed CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, CommandError> {
        let check_command = CommandLine::parse(&args.check_command)?;
        Ok(Self::new(&args.path, check_command)
            .assume_yes(args.yes)
            .dry_run(args.dry_run)
            .only(args.only.clone())
            .exclude(args.exclude.clone()))
    }
}

/// One run of the upgrade workflow against a single checkout
pub struct Session<R: CommandRunner, O: Operator> {
    config: SessionConfig,
    manager: Box<dyn PackageManager>,
    runner: R,
    operator: O,
    started_at: DateTime<Utc>,
}

impl<R: CommandRunner, O: Operator> Session<R, O> {
    pub fn new(
        config: SessionConfig,
        manager: Box<dyn PackageManager>,
        runner: R,
        operator: O,
    ) -> Self {
        Self {
            config,
            manager,
            runner,
            operator,
            started_at: Utc::now(),
        }
    }

    /// Pin the session start time used to name the work branch
    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    /// Run the session to completion.
    ///
    /// Returns an error only for failures that end the session before any
    /// package is touched: a failing baseline, a failed prompt, or a branch
    /// that cannot be determined or created.
    pub async fn run(&mut self) -> Result<SessionReport, SessionError> {
        let mut report = SessionReport::new(self.manager.kind());

        self.check_baseline().await?;

        let outdated = self.resolve(&mut report).await;
        if outdated.is_empty() && !report.skipped.is_empty() {
            self.operator.notice(&format!(
                "Every outdated package was filtered out: {}",
                report.skipped.join(", ")
            ));
            report.status = SessionStatus::Filtered;
            return Ok(report);
        }
        if outdated.is_empty() {
            debug!("nothing to upgrade");
            report.status = SessionStatus::UpToDate;
            return Ok(report);
        }

        self.operator.present(&outdated);

        if self.config.dry_run {
            report.status = SessionStatus::DryRun;
            report.pending = names_of(&outdated);
            return Ok(report);
        }

        if !self.config.assume_yes && !self.operator.confirm(&outdated)? {
            self.operator.notice("Aborted by user.");
            report.status = SessionStatus::Declined;
            report.pending = names_of(&outdated);
            return Ok(report);
        }

        let git = Git::new(&self.runner);
        let original_branch = git.current_branch().await?;
        let work_branch = work_branch_name(self.started_at);
        git.create_branch(&work_branch).await?;
        self.operator.branch_created(&work_branch, &original_branch);
        report.original_branch = Some(original_branch);
        report.work_branch = Some(work_branch);

        let engine = UpgradeEngine::new(
            &self.runner,
            self.manager.as_ref(),
            &self.config.check_command,
            &self.config.root,
        );
        let total = outdated.len();
        for (index, package) in outdated.iter().enumerate() {
            self.operator.package_started(index + 1, total, package);
            let result = engine.upgrade(package, &mut self.operator).await;
            self.operator.package_finished(&result);
            report.add_result(result);
        }

        report.status = SessionStatus::Completed;
        info!(
            "session finished: {} upgraded, {} reverted",
            report.upgraded_count(),
            report.reverted_count()
        );
        Ok(report)
    }

    async fn check_baseline(&mut self) -> Result<(), SessionError> {
        let check = &self.config.check_command;
        self.operator.baseline_started(check);
        let result = self.runner.stream(check).await;
        if let Err(ref e) = result {
            debug!("baseline check failed: {}", e);
        }
        self.operator.baseline_finished(result.is_ok(), check);
        result
            .map(|_| ())
            .map_err(|_| SessionError::baseline_check_failed(check.to_string()))
    }

    /// Resolve and filter the outdated set; query errors become an empty set
    async fn resolve(&mut self, report: &mut SessionReport) -> OutdatedSet {
        self.operator.outdated_started(self.manager.kind());
        let resolved = outdated::resolve(&self.runner, self.manager.as_ref()).await;
        self.operator.outdated_finished(resolved.as_ref());

        let outdated = match resolved {
            Ok(set) => set,
            Err(e) => {
                report.warnings.push(e.to_string());
                return OutdatedSet::default();
            }
        };

        for name in &self.config.only {
            if !outdated.iter().any(|p| &p.name == name) {
                let message = format!("{} is not outdated; ignoring --only {}", name, name);
                self.operator.warning(&message);
                report.warnings.push(message);
            }
        }

        let all = names_of(&outdated);
        let filtered = outdated.filtered(&self.config.only, &self.config.exclude);
        report.skipped = all
            .into_iter()
            .filter(|name| !filtered.iter().any(|p| &p.name == name))
            .collect();
        debug!(
            "{} packages left after filtering, {} skipped",
            filtered.len(),
            report.skipped.len()
        );
        filtered
    }
}

fn names_of(outdated: &OutdatedSet) -> Vec<String> {
    outdated.names().into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PackageManagerKind, TransactionOutcome};
    use crate::package_manager::profile;
    use crate::test_support::{RecordingOperator, Reply, ScriptedRunner};
    use chrono::TimeZone;
    use tempfile::TempDir;

    const CHECK: &str = "npm test";
    const QUERY: &str = "npm outdated --json";
    const REV_PARSE: &str = "git rev-parse --abbrev-ref HEAD";
    const BRANCH: &str = "git checkout -b update-deps-1700000000000";
    const TWO_OUTDATED: &str = r#"{
        "lodash": {"current": "4.17.20", "wanted": "4.17.21", "latest": "4.17.21"},
        "chalk": {"current": "4.1.2", "wanted": "4.1.2", "latest": "5.3.0"}
    }"#;

    fn session(
        dir: &TempDir,
        runner: ScriptedRunner,
        answer: bool,
    ) -> Session<ScriptedRunner, RecordingOperator> {
        let config = SessionConfig::new(dir.path(), CommandLine::new("npm").arg("test"));
        session_with(config, runner, answer)
    }

    fn session_with(
        config: SessionConfig,
        runner: ScriptedRunner,
        answer: bool,
    ) -> Session<ScriptedRunner, RecordingOperator> {
        Session::new(
            config,
            profile(PackageManagerKind::Npm),
            runner,
            RecordingOperator::answering(answer),
        )
        .with_started_at(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
    }

    fn installs(runner: &ScriptedRunner) -> Vec<String> {
        runner
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("npm install "))
            .collect()
    }

    #[tokio::test]
    async fn test_baseline_failure_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on(CHECK, Reply::fail(1))
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""));
        let mut session = session(&dir, runner, true);

        let err = session.run().await.unwrap_err();

        assert!(matches!(err, SessionError::BaselineCheckFailed { .. }));
        assert_eq!(err.command(), Some(CHECK));
        assert_eq!(session.runner().calls(), vec![CHECK]);
        assert!(session.operator().saw("baseline_finished:false"));
    }

    #[tokio::test]
    async fn test_empty_outdated_set_is_up_to_date() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(QUERY, Reply::ok(""));
        let mut session = session(&dir, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::UpToDate);
        assert!(report.packages.is_empty());
        assert_eq!(session.runner().calls(), vec![CHECK, QUERY]);
        assert!(!session.operator().saw("confirm"));
    }

    #[tokio::test]
    async fn test_malformed_output_is_up_to_date_with_warning() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(QUERY, Reply::fail_with(1, "npm WARN {", ""));
        let mut session = session(&dir, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::UpToDate);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("malformed"));
        assert_eq!(session.runner().count(REV_PARSE), 0);
    }

    #[tokio::test]
    async fn test_query_failure_is_up_to_date_with_warning() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(QUERY, Reply::fail_with(2, "", "npm ERR! network"));
        let mut session = session(&dir, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::UpToDate);
        assert!(report.warnings[0].contains("failed to query outdated packages"));
        assert!(session.operator().saw("outdated_failed"));
    }

    #[tokio::test]
    async fn test_declined_has_no_side_effects() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""));
        let mut session = session(&dir, runner, false);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::Declined);
        assert_eq!(report.pending, vec!["lodash", "chalk"]);
        assert_eq!(session.runner().calls(), vec![CHECK, QUERY]);
        assert!(session.operator().saw("present:lodash,chalk"));
        assert!(session.operator().saw("confirm"));
    }

    #[tokio::test]
    async fn test_dry_run_stops_after_presenting() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""));
        let config = SessionConfig::new(dir.path(), CommandLine::new("npm").arg("test"))
            .dry_run(true);
        let mut session = session_with(config, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::DryRun);
        assert_eq!(report.pending, vec!["lodash", "chalk"]);
        assert_eq!(session.runner().calls(), vec![CHECK, QUERY]);
        assert!(!session.operator().saw("confirm"));
    }

    #[tokio::test]
    async fn test_processes_every_package_in_order() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""))
            .on(REV_PARSE, Reply::ok("main\n"));
        let mut session = session(&dir, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::Completed);
        assert_eq!(report.original_branch.as_deref(), Some("main"));
        assert_eq!(report.work_branch.as_deref(), Some("update-deps-1700000000000"));
        let names: Vec<_> = report.packages.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["lodash", "chalk"]);
        assert_eq!(
            installs(session.runner()),
            vec!["npm install lodash@latest", "npm install chalk@latest"]
        );
        assert!(session.operator().saw("package_started:1/2:lodash"));
        assert!(session.operator().saw("package_started:2/2:chalk"));
        assert!(session
            .operator()
            .saw("branch_created:update-deps-1700000000000:main"));
    }

    #[tokio::test]
    async fn test_branch_created_before_first_install() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""))
            .on(REV_PARSE, Reply::ok("main\n"));
        let mut session = session(&dir, runner, true);

        session.run().await.unwrap();

        let calls = session.runner().calls();
        let branch_at = calls.iter().position(|c| c == BRANCH).unwrap();
        let install_at = calls
            .iter()
            .position(|c| c == "npm install lodash@latest")
            .unwrap();
        assert!(branch_at < install_at);
        assert_eq!(calls[..4], [CHECK, QUERY, REV_PARSE, BRANCH]);
    }

    #[tokio::test]
    async fn test_mixed_outcomes_continue() {
        let dir = TempDir::new().unwrap();
        // baseline passes, lodash check fails, chalk check passes
        let runner = ScriptedRunner::new()
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""))
            .on(REV_PARSE, Reply::ok("main\n"))
            .on(CHECK, Reply::ok(""))
            .on(CHECK, Reply::fail(1))
            .on(CHECK, Reply::ok(""));
        let mut session = session(&dir, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.packages.len(), 2);
        assert_eq!(report.packages[0].outcome, TransactionOutcome::RevertedOnFailure);
        assert_eq!(report.packages[1].outcome, TransactionOutcome::Committed);
        assert_eq!(report.upgraded_count(), 1);
        assert_eq!(report.reverted_count(), 1);
        assert_eq!(
            session
                .runner()
                .count("git restore package.json package-lock.json"),
            1
        );
    }

    #[tokio::test]
    async fn test_branch_detection_failure_aborts_before_install() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""))
            .on(REV_PARSE, Reply::fail_with(128, "", "fatal: not a git repository"));
        let mut session = session(&dir, runner, true);

        let err = session.run().await.unwrap_err();

        assert!(matches!(err, SessionError::BranchDetectionFailed { .. }));
        assert!(installs(session.runner()).is_empty());
        assert_eq!(session.runner().count(BRANCH), 0);
    }

    #[tokio::test]
    async fn test_branch_creation_failure_aborts_before_install() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""))
            .on(REV_PARSE, Reply::ok("main"))
            .on(BRANCH, Reply::fail(128));
        let mut session = session(&dir, runner, true);

        let err = session.run().await.unwrap_err();

        assert!(matches!(err, SessionError::BranchCreationFailed { .. }));
        assert!(installs(session.runner()).is_empty());
    }

    #[tokio::test]
    async fn test_assume_yes_skips_prompt() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""))
            .on(REV_PARSE, Reply::ok("main"));
        let config = SessionConfig::new(dir.path(), CommandLine::new("npm").arg("test"))
            .assume_yes(true);
        let mut session = session_with(config, runner, false);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::Completed);
        assert!(!session.operator().saw("confirm"));
    }

    #[tokio::test]
    async fn test_filters_restrict_packages() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new()
            .on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""))
            .on(REV_PARSE, Reply::ok("main"));
        let config = SessionConfig::new(dir.path(), CommandLine::new("npm").arg("test"))
            .exclude(vec!["lodash".to_string()]);
        let mut session = session_with(config, runner, true);

        let report = session.run().await.unwrap();

        let names: Vec<_> = report.packages.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["chalk"]);
        assert_eq!(report.skipped, vec!["lodash"]);
    }

    #[tokio::test]
    async fn test_filters_removing_everything_is_not_up_to_date() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""));
        let config = SessionConfig::new(dir.path(), CommandLine::new("npm").arg("test"))
            .exclude(vec!["lodash".to_string(), "chalk".to_string()]);
        let mut session = session_with(config, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::Filtered);
        assert_eq!(report.skipped, vec!["lodash", "chalk"]);
        assert!(report.packages.is_empty());
        assert_eq!(session.runner().calls(), vec![CHECK, QUERY]);
        assert!(session
            .operator()
            .saw("notice:Every outdated package was filtered out: lodash, chalk"));
    }

    #[tokio::test]
    async fn test_only_unknown_package_warns() {
        let dir = TempDir::new().unwrap();
        let runner = ScriptedRunner::new().on(QUERY, Reply::fail_with(1, TWO_OUTDATED, ""));
        let config = SessionConfig::new(dir.path(), CommandLine::new("npm").arg("test"))
            .only(vec!["react".to_string()]);
        let mut session = session_with(config, runner, true);

        let report = session.run().await.unwrap();

        assert_eq!(report.status, SessionStatus::Filtered);
        assert_eq!(report.skipped, vec!["lodash", "chalk"]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("react is not outdated"));
    }

    #[test]
    fn test_config_from_cli() {
        use clap::Parser;
        let args = CliArgs::parse_from([
            "autoupgrade",
            "yarn run 'unit tests'",
            "-C",
            "/repo",
            "-y",
            "--only",
            "lodash",
        ]);
        let config = SessionConfig::from_cli(&args).unwrap();
        assert_eq!(config.root, PathBuf::from("/repo"));
        assert_eq!(config.check_command.program(), "yarn");
        assert_eq!(config.check_command.arguments(), ["run", "unit tests"]);
        assert!(config.assume_yes);
        assert!(!config.dry_run);
        assert_eq!(config.only, vec!["lodash"]);
    }

    #[test]
    fn test_config_from_cli_rejects_unbalanced_quote() {
        use clap::Parser;
        let args = CliArgs::parse_from(["autoupgrade", "npm run 'test"]);
        assert!(matches!(
            SessionConfig::from_cli(&args),
            Err(CommandError::UnbalancedQuote { .. })
        ));
    }
}
