//! Git operations used to isolate a session on its own branch

use crate::command::{CommandLine, CommandRunner};
use crate::error::SessionError;
use chrono::{DateTime, Utc};
use log::debug;

/// Prefix of every work branch
pub const WORK_BRANCH_PREFIX: &str = "update-deps-";

/// Work branch name for a session started at `started_at`
pub fn work_branch_name(started_at: DateTime<Utc>) -> String {
    format!("{}{}", WORK_BRANCH_PREFIX, started_at.timestamp_millis())
}

/// Git driven through the command runner
pub struct Git<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> Git<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    fn current_branch_command() -> CommandLine {
        CommandLine::new("git").args(["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Name of the checked-out branch.
    ///
    /// A detached HEAD has no name to return to and is reported as a failure.
    pub async fn current_branch(&self) -> Result<String, SessionError> {
        let command = Self::current_branch_command();
        let output = self
            .runner
            .capture(&command)
            .await
            .map_err(|e| SessionError::branch_detection_failed(command.to_string(), e.to_string()))?;

        let branch = output.stdout.trim();
        match branch {
            "" => Err(SessionError::branch_detection_failed(
                command.to_string(),
                "git printed no branch name",
            )),
            "HEAD" => Err(SessionError::branch_detection_failed(
                command.to_string(),
                "HEAD is detached; check out a branch first",
            )),
            name => {
                debug!("current branch is {}", name);
                Ok(name.to_string())
            }
        }
    }

    /// Create `branch` from the current HEAD and switch to it
    pub async fn create_branch(&self, branch: &str) -> Result<(), SessionError> {
        let command = CommandLine::new("git").args(["checkout", "-b", branch]);
        self.runner.capture(&command).await.map_err(|e| {
            SessionError::branch_creation_failed(branch, command.to_string(), e.to_string())
        })?;
        debug!("switched to new branch {}", branch);
        Ok(())
    }
}
