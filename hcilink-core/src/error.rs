/*!
 * Error taxonomy for the scan/connect workflow
 * Command failures keep the raw tool output verbatim
 */

use std::io;
use thiserror::Error;

use crate::command::{CommandLine, CommandOutcome};

/// A privileged command that ran and exited non-zero (or was killed by a signal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub command: String,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandFailure {
    pub fn new(command: &CommandLine, outcome: CommandOutcome) -> Self {
        Self {
            command: command.to_string(),
            exit_code: outcome.exit_code,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
        }
    }

    /// Combined stderr/stdout text shown to the operator.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        format!(
            "{}. Stdout: {}",
            if stderr.is_empty() { "Unknown error" } else { stderr },
            if stdout.is_empty() { "No standard output" } else { stdout },
        )
    }
}

impl std::fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.diagnostic())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service {service} failed to start: {failure}")]
    Failed { service: String, failure: CommandFailure },

    #[error("could not run `{command}`: {source}")]
    Launch { command: String, source: io::Error },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{0}")]
    Failed(CommandFailure),

    #[error("could not run `{command}`: {source}")]
    Launch { command: String, source: io::Error },
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("{0}")]
    Failed(CommandFailure),

    #[error("could not run `{command}`: {source}")]
    Launch { command: String, source: io::Error },
}

/// Conditions caused by the operator rather than the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserInputError {
    #[error("No device selected")]
    NoSelection,

    #[error("No devices available, run a scan first")]
    NoDevicesAvailable,

    #[error("Device `{0}` is not in the latest scan result, scan again")]
    UnknownDevice(String),

    #[error("Another operation is still in progress")]
    Busy,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Failed to scan devices: {0}")]
    Service(#[from] ServiceError),

    #[error("Failed to scan devices: {0}")]
    Scan(#[from] ScanError),

    #[error("Failed to connect to device: {0}")]
    Connection(#[from] ConnectionError),

    #[error("{0}")]
    UserInput(#[from] UserInputError),
}

impl WorkflowError {
    pub fn is_user_error(&self) -> bool {
        matches!(self, WorkflowError::UserInput(_))
    }

    /// The failed command's payload, when the error came from one.
    pub fn command_failure(&self) -> Option<&CommandFailure> {
        match self {
            WorkflowError::Service(ServiceError::Failed { failure, .. })
            | WorkflowError::Scan(ScanError::Failed(failure))
            | WorkflowError::Connection(ConnectionError::Failed(failure)) => Some(failure),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
