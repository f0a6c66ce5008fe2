//! Application error types using thiserror
//!
//! Error hierarchy:
//! - CommandError: a subprocess could not be run, or exited non-zero
//! - DetectError: no lockfile to pick a package manager from
//! - OutdatedError: the outdated query failed or produced unreadable output
//! - ManifestError: package.json could not be read (informational only)
//! - SessionError: fatal failures that end a session

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::domain::PackageManagerKind;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Subprocess related errors
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Package manager detection errors
    #[error(transparent)]
    Detect(#[from] DetectError),

    /// Outdated query errors
    #[error(transparent)]
    Outdated(#[from] OutdatedError),

    /// Session-ending errors
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AppError {
    /// The command line an operator can rerun to reproduce the failure
    pub fn failed_command(&self) -> Option<&str> {
        match self {
            AppError::Command(e) => e.command(),
            AppError::Detect(_) => None,
            AppError::Outdated(e) => e.command(),
            AppError::Session(e) => e.command(),
        }
    }
}

/// Errors raised by the command runner
#[derive(Error, Debug)]
pub enum CommandError {
    /// Nothing to execute
    #[error("empty command")]
    EmptyCommand,

    /// A quoted segment was never closed
    #[error("unbalanced quote in command: {command}")]
    UnbalancedQuote { command: String },

    /// The process could not be spawned or waited on
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited unsuccessfully
    #[error("'{command}' {}", exit_detail(.status, .stderr))]
    NonZeroExit {
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The process was killed after exceeding the configured timeout
    #[error("'{command}' did not finish within {}s and was killed", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },
}

/// Exit status plus the last line of stderr, for messages
pub(crate) fn exit_detail(status: &Option<i32>, stderr: &str) -> String {
    let status = match status {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    };
    match stderr.trim().lines().last() {
        Some(line) if !line.trim().is_empty() => format!("{}: {}", status, line.trim()),
        _ => status,
    }
}

impl CommandError {
    /// Creates a new NonZeroExit error
    pub fn non_zero_exit(
        command: impl Into<String>,
        status: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        CommandError::NonZeroExit {
            command: command.into(),
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Creates a new Spawn error
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        CommandError::Spawn {
            command: command.into(),
            source,
        }
    }

    /// The rendered command line, when one was involved
    pub fn command(&self) -> Option<&str> {
        match self {
            CommandError::EmptyCommand => None,
            CommandError::UnbalancedQuote { command }
            | CommandError::Spawn { command, .. }
            | CommandError::NonZeroExit { command, .. }
            | CommandError::TimedOut { command, .. } => Some(command),
        }
    }

    /// Exit status of the process, if it ran to completion
    pub fn status(&self) -> Option<i32> {
        match self {
            CommandError::NonZeroExit { status, .. } => *status,
            _ => None,
        }
    }
}

/// Errors related to package manager detection
#[derive(Error, Debug)]
pub enum DetectError {
    /// None of the supported lockfiles exist in the repository root
    #[error(
        "no lockfile found in {path}: expected yarn.lock, pnpm-lock.yaml or package-lock.json"
    )]
    NoLockfileFound { path: PathBuf },
}

impl DetectError {
    /// Creates a new NoLockfileFound error
    pub fn no_lockfile(path: impl Into<PathBuf>) -> Self {
        DetectError::NoLockfileFound { path: path.into() }
    }
}

/// Errors related to resolving the outdated set
#[derive(Error, Debug)]
pub enum OutdatedError {
    /// The query itself failed without producing a payload
    #[error("failed to query outdated packages with '{command}': {message}")]
    QueryFailed { command: String, message: String },

    /// The query produced output that could not be parsed
    #[error("malformed JSON in {manager} outdated output: {message}")]
    Malformed {
        manager: PackageManagerKind,
        message: String,
    },
}

impl OutdatedError {
    /// Creates a new QueryFailed error
    pub fn query_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        OutdatedError::QueryFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a new Malformed error
    pub fn malformed(manager: PackageManagerKind, message: impl Into<String>) -> Self {
        OutdatedError::Malformed {
            manager,
            message: message.into(),
        }
    }

    /// The query command line, when the query itself failed
    pub fn command(&self) -> Option<&str> {
        match self {
            OutdatedError::QueryFailed { command, .. } => Some(command),
            OutdatedError::Malformed { .. } => None,
        }
    }
}

/// Errors related to reading the manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },
}

impl ManifestError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors that end a session before or during branch setup
#[derive(Error, Debug)]
pub enum SessionError {
    /// The check command failed before anything was touched
    #[error("initial checks failed: '{command}' did not pass")]
    BaselineCheckFailed { command: String },

    /// The starting branch could not be determined
    #[error("failed to determine the current branch with '{command}': {message}")]
    BranchDetectionFailed { command: String, message: String },

    /// The work branch could not be created
    #[error("failed to create branch {branch} with '{command}': {message}")]
    BranchCreationFailed {
        branch: String,
        command: String,
        message: String,
    },

    /// The confirmation prompt could not be shown or answered
    #[error("failed to read confirmation: {message}")]
    Prompt { message: String },
}

impl SessionError {
    /// Creates a new BaselineCheckFailed error
    pub fn baseline_check_failed(command: impl Into<String>) -> Self {
        SessionError::BaselineCheckFailed {
            command: command.into(),
        }
    }

    /// Creates a new BranchDetectionFailed error
    pub fn branch_detection_failed(
        command: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SessionError::BranchDetectionFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a new BranchCreationFailed error
    pub fn branch_creation_failed(
        branch: impl Into<String>,
        command: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SessionError::BranchCreationFailed {
            branch: branch.into(),
            command: command.into(),
            message: message.into(),
        }
    }

    /// The command line involved in the failure, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            SessionError::BaselineCheckFailed { command }
            | SessionError::BranchDetectionFailed { command, .. }
            | SessionError::BranchCreationFailed { command, .. } => Some(command),
            SessionError::Prompt { .. } => None,
        }
    }
}
