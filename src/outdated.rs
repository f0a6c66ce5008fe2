//! Outdated-set resolution
//!
//! Every supported package manager exits non-zero when it finds outdated
//! packages and prints the report anyway, while a clean tree exits zero with
//! no output. The exit status is therefore only informational once a
//! payload exists:
//!
//! | exit     | payload          | result                     |
//! |----------|------------------|----------------------------|
//! | 0        | empty            | empty set                  |
//! | any      | parses           | packages from the payload  |
//! | any      | does not parse   | `OutdatedError::Malformed` |
//! | non-zero | empty            | `OutdatedError::QueryFailed` |
//! | spawn/timeout failure | -   | `OutdatedError::QueryFailed` |

use crate::command::{CapturedOutput, CommandLine, CommandRunner};
use crate::domain::OutdatedSet;
use crate::error::{exit_detail, CommandError, OutdatedError};
use crate::package_manager::PackageManager;
use log::{debug, error, warn};

/// Classified result of running the outdated query
#[derive(Debug)]
pub enum OutdatedQuery {
    /// The query succeeded and reported nothing
    EmptySet,
    /// The query produced a payload to parse, whatever its exit status
    NonEmptySet(String),
    /// The query failed without a usable payload
    QueryError(OutdatedError),
}

/// Picks the stream carrying the structured report
fn payload_of(stdout: &str, stderr: &str) -> Option<String> {
    if !stdout.trim().is_empty() {
        return Some(stdout.to_string());
    }
    let stderr = stderr.trim_start();
    if stderr.starts_with('{') || stderr.starts_with('[') {
        return Some(stderr.to_string());
    }
    None
}

impl OutdatedQuery {
    /// Classify a finished query
    pub fn classify(
        command: &CommandLine,
        result: Result<CapturedOutput, CommandError>,
    ) -> Self {
        match result {
            Ok(output) => match payload_of(&output.stdout, &output.stderr) {
                Some(payload) => OutdatedQuery::NonEmptySet(payload),
                None => OutdatedQuery::EmptySet,
            },
            Err(CommandError::NonZeroExit {
                status,
                stdout,
                stderr,
                ..
            }) => match payload_of(&stdout, &stderr) {
                Some(payload) => {
                    debug!(
                        "`{}` exited with {:?} and a payload; treating as informational",
                        command, status
                    );
                    OutdatedQuery::NonEmptySet(payload)
                }
                None => OutdatedQuery::QueryError(OutdatedError::query_failed(
                    command.to_string(),
                    exit_detail(&status, &stderr),
                )),
            },
            Err(other) => OutdatedQuery::QueryError(OutdatedError::query_failed(
                command.to_string(),
                other.to_string(),
            )),
        }
    }
}

/// Run the outdated query once and normalise its report.
///
/// Errors are returned for the caller to report; the session treats every
/// error here as "nothing to upgrade" rather than aborting.
pub async fn resolve<R>(
    runner: &R,
    manager: &dyn PackageManager,
) -> Result<OutdatedSet, OutdatedError>
where
    R: CommandRunner + ?Sized,
{
    let command = manager.query_outdated();
    let result = runner.capture(&command).await;

    match OutdatedQuery::classify(&command, result) {
        OutdatedQuery::EmptySet => Ok(OutdatedSet::default()),
        OutdatedQuery::NonEmptySet(payload) => match manager.parse_outdated(&payload) {
            Ok(packages) => {
                debug!("{} reported {} outdated packages", manager.kind(), packages.len());
                Ok(OutdatedSet::new(packages))
            }
            Err(message) => {
                let err = OutdatedError::malformed(manager.kind(), message);
                warn!("{}", err);
                Err(err)
            }
        },
        OutdatedQuery::QueryError(err) => {
            error!("{}", err);
            Err(err)
        }
    }
}
