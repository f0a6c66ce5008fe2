//! Command runner for external tools
//!
//! This module provides:
//! - `CommandLine`: a program plus arguments, split from a shell string
//!   without ever invoking a shell
//! - `CommandRunner`: the seam every subprocess goes through
//! - `SystemRunner`: the real implementation on top of tokio processes

use crate::error::CommandError;
use async_trait::async_trait;
use log::debug;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

/// An executable and its argument list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?:[^\s"']+|"[^"]*"|'[^']*')+"#).expect("Invalid token pattern")
    })
}

fn quote_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).expect("Invalid quote pattern"))
}

fn unquote(token: &str) -> String {
    quote_pattern()
        .replace_all(token, |caps: &regex::Captures| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map_or(String::new(), |m| m.as_str().to_string())
        })
        .into_owned()
}

impl CommandLine {
    /// Create a command line with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Split a shell-style string into program and arguments.
    ///
    /// Whitespace separates tokens; single- or double-quoted segments stay in
    /// one token with the quotes removed. No expansion of any kind happens.
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let mut tokens = Vec::new();
        let mut cursor = 0;

        for token in token_pattern().find_iter(input) {
            if !input[cursor..token.start()].trim().is_empty() {
                return Err(CommandError::UnbalancedQuote {
                    command: input.to_string(),
                });
            }
            tokens.push(unquote(token.as_str()));
            cursor = token.end();
        }
        if !input[cursor..].trim().is_empty() {
            return Err(CommandError::UnbalancedQuote {
                command: input.to_string(),
            });
        }

        let mut tokens = tokens.into_iter();
        let program = tokens.next().ok_or(CommandError::EmptyCommand)?;
        Ok(Self {
            program,
            args: tokens.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

fn display_token(token: &str) -> String {
    if token.is_empty() {
        "''".to_string()
    } else if token.contains('\'') && token.contains(char::is_whitespace) {
        format!("\"{}\"", token)
    } else if token.contains(char::is_whitespace) || token.contains('"') {
        format!("'{}'", token)
    } else {
        token.to_string()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", display_token(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", display_token(arg))?;
        }
        Ok(())
    }
}

/// How a subprocess's standard streams are wired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Capture stdout and stderr for the caller to inspect
    Capture,
    /// Inherit the terminal so the operator sees the output live
    Inherit,
}

/// Output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// Exit status code
    pub status: Option<i32>,
    /// Standard output (empty in inherit mode)
    pub stdout: String,
    /// Standard error (empty in inherit mode)
    pub stderr: String,
}

/// Trait for running external commands
///
/// Implementations run exactly one attempt per call and never swallow a
/// non-zero exit: that is always `CommandError::NonZeroExit`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command with the given stream wiring
    async fn run(
        &self,
        command: &CommandLine,
        mode: StreamMode,
    ) -> Result<CapturedOutput, CommandError>;

    /// Run a command and capture its output
    async fn capture(&self, command: &CommandLine) -> Result<CapturedOutput, CommandError> {
        self.run(command, StreamMode::Capture).await
    }

    /// Run a command with output streamed to the operator
    async fn stream(&self, command: &CommandLine) -> Result<CapturedOutput, CommandError> {
        self.run(command, StreamMode::Inherit).await
    }
}

/// Command runner that spawns real processes
#[derive(Debug, Clone)]
pub struct SystemRunner {
    /// Directory every command runs in
    working_dir: PathBuf,
    /// Upper bound on a single command's runtime
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Create a runner rooted at the given directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: working_dir.as_ref().to_path_buf(),
            timeout: None,
        }
    }

    /// Kill and fail any command that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        command: &CommandLine,
        mode: StreamMode,
    ) -> Result<CapturedOutput, CommandError> {
        let rendered = command.to_string();
        debug!("running `{}` in {}", rendered, self.working_dir.display());

        let mut process = tokio::process::Command::new(command.program());
        process
            .args(command.arguments())
            .current_dir(&self.working_dir)
            .kill_on_drop(true);

        match mode {
            StreamMode::Capture => {
                process
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
            StreamMode::Inherit => {
                process
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
        }

        let child = process
            .spawn()
            .map_err(|e| CommandError::spawn(&rendered, e))?;

        let waited = child.wait_with_output();
        let output = match self.timeout {
            // Dropping the future drops the child, and kill_on_drop kills it.
            Some(limit) => match tokio::time::timeout(limit, waited).await {
                Ok(result) => result,
                Err(_) => {
                    debug!("`{}` timed out after {:?}", rendered, limit);
                    return Err(CommandError::TimedOut {
                        command: rendered,
                        timeout: limit,
                    });
                }
            },
            None => waited.await,
        }
        .map_err(|e| CommandError::spawn(&rendered, e))?;

        let captured = CapturedOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!("`{}` exited with {:?}", rendered, captured.status);

        if output.status.success() {
            Ok(captured)
        } else {
            Err(CommandError::non_zero_exit(
                rendered,
                captured.status,
                captured.stdout,
                captured.stderr,
            ))
        }
    }
}
