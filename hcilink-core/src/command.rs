/*!
 * External command execution
 * Every host interaction goes through a CommandRunner
 */

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::config::{AdapterConfig, InquirySubcommand, ServiceSpec, ToolsConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of one finished process. Consumed by the caller, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for CommandOutcome {
    fn from(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion. `Err` means it could not be launched or timed out.
    async fn run(&self, command: &CommandLine) -> io::Result<CommandOutcome>;
}

pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandLine) -> io::Result<CommandOutcome> {
        tracing::debug!("Running: {}", command);

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the child on timeout kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        };

        let outcome = CommandOutcome::from(output);
        tracing::debug!("`{}` exited with {:?}", command, outcome.exit_code);
        Ok(outcome)
    }
}

/// Builds the host command lines from configuration.
#[derive(Debug, Clone)]
pub struct Toolchain {
    tools: ToolsConfig,
    interface: String,
    inquiry: InquirySubcommand,
}

impl Toolchain {
    pub fn new(tools: &ToolsConfig, adapter: &AdapterConfig) -> Self {
        Self {
            tools: tools.clone(),
            interface: adapter.interface.clone(),
            inquiry: adapter.inquiry_subcommand,
        }
    }

    pub fn running_marker(&self) -> &str {
        &self.tools.running_marker
    }

    /// `<status-tool> <service> status`, run unprivileged.
    pub fn status(&self, service: &str) -> CommandLine {
        CommandLine::new(self.tools.status_tool.clone(), [service, "status"])
    }

    pub fn start(&self, spec: &ServiceSpec) -> CommandLine {
        let mut args = vec![spec.name.clone(), spec.start_variant.clone()];
        args.extend(spec.arg.iter().cloned());
        self.privileged(&self.tools.start_tool, args)
    }

    pub fn inquiry(&self) -> CommandLine {
        self.privileged(
            &self.tools.control_tool,
            vec![
                "-n".to_string(),
                self.interface.clone(),
                self.inquiry.as_str().to_string(),
            ],
        )
    }

    pub fn create_connection(&self, target: &str) -> CommandLine {
        self.privileged(
            &self.tools.control_tool,
            vec![
                "-n".to_string(),
                self.interface.clone(),
                "create_connection".to_string(),
                target.to_string(),
            ],
        )
    }

    fn privileged(&self, program: &str, args: Vec<String>) -> CommandLine {
        let runner = self.tools.privileged_runner.trim();
        if runner.is_empty() {
            return CommandLine::new(program, args);
        }

        let mut full = vec![program.to_string()];
        full.extend(args);
        CommandLine::new(runner, full)
    }
}
