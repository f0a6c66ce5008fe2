//! Test doubles shared by the unit tests

use crate::command::{CapturedOutput, CommandLine, CommandRunner, StreamMode};
use crate::domain::{
    OutdatedPackage, OutdatedSet, PackageManagerKind, PackageResult, TransactionState,
};
use crate::error::{CommandError, OutdatedError, SessionError};
use crate::operator::Operator;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Canned response for one command invocation
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    Fail {
        status: i32,
        stdout: String,
        stderr: String,
    },
    SpawnError,
    /// Killed after exceeding the runner's timeout
    TimedOut(Duration),
}

impl Reply {
    pub fn ok(stdout: &str) -> Self {
        Reply::Ok(stdout.to_string())
    }

    pub fn fail(status: i32) -> Self {
        Reply::Fail {
            status,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn fail_with(status: i32, stdout: &str, stderr: &str) -> Self {
        Reply::Fail {
            status,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }
}

/// Runner answering from a script keyed by rendered command line.
///
/// Each command has a queue of replies; the last reply repeats once the
/// queue is down to one. Unscripted commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, StreamMode)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, command: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn calls_with_mode(&self) -> Vec<(String, StreamMode)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == command).count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        command: &CommandLine,
        mode: StreamMode,
    ) -> Result<CapturedOutput, CommandError> {
        let rendered = command.to_string();
        self.calls.lock().unwrap().push((rendered.clone(), mode));

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.get_mut(&rendered) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply.unwrap_or_else(|| Reply::ok("")) {
            Reply::Ok(stdout) => Ok(CapturedOutput {
                status: Some(0),
                stdout,
                stderr: String::new(),
            }),
            Reply::Fail {
                status,
                stdout,
                stderr,
            } => Err(CommandError::non_zero_exit(rendered, Some(status), stdout, stderr)),
            Reply::SpawnError => Err(CommandError::spawn(
                rendered,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            )),
            Reply::TimedOut(timeout) => Err(CommandError::TimedOut {
                command: rendered,
                timeout,
            }),
        }
    }
}

/// Operator that records every callback and answers the prompt from a flag
pub struct RecordingOperator {
    pub answer: bool,
    pub events: Vec<String>,
}

impl RecordingOperator {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            events: Vec::new(),
        }
    }

    pub fn saw(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

impl Operator for RecordingOperator {
    fn baseline_started(&mut self, _check: &CommandLine) {
        self.events.push("baseline_started".to_string());
    }

    fn baseline_finished(&mut self, passed: bool, _check: &CommandLine) {
        self.events.push(format!("baseline_finished:{}", passed));
    }

    fn outdated_started(&mut self, manager: PackageManagerKind) {
        self.events.push(format!("outdated_started:{}", manager));
    }

    fn outdated_finished(&mut self, outcome: Result<&OutdatedSet, &OutdatedError>) {
        match outcome {
            Ok(set) => self.events.push(format!("outdated_finished:{}", set.len())),
            Err(_) => self.events.push("outdated_failed".to_string()),
        }
    }

    fn present(&mut self, outdated: &OutdatedSet) {
        self.events.push(format!("present:{}", outdated.names().join(",")));
    }

    fn confirm(&mut self, _outdated: &OutdatedSet) -> Result<bool, SessionError> {
        self.events.push("confirm".to_string());
        Ok(self.answer)
    }

    fn branch_created(&mut self, work_branch: &str, original_branch: &str) {
        self.events
            .push(format!("branch_created:{}:{}", work_branch, original_branch));
    }

    fn package_started(&mut self, index: usize, total: usize, package: &OutdatedPackage) {
        self.events
            .push(format!("package_started:{}/{}:{}", index, total, package.name));
    }

    fn package_phase(&mut self, package: &str, state: TransactionState) {
        self.events.push(format!("phase:{}:{}", package, state));
    }

    fn package_finished(&mut self, result: &PackageResult) {
        self.events
            .push(format!("package_finished:{}:{:?}", result.name, result.outcome));
    }

    fn notice(&mut self, message: &str) {
        self.events.push(format!("notice:{}", message));
    }

    fn warning(&mut self, message: &str) {
        self.events.push(format!("warning:{}", message));
    }
}
