/*!
 * System service probing and start-up
 */

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::audit::{AuditEntry, AuditSink};
use crate::command::{CommandRunner, Toolchain};
use crate::config::ServiceSpec;
use crate::error::{CommandFailure, ServiceError};

/// Read fresh on every probe; services change state behind our back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Running => "running",
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Unknown => "unknown",
        })
    }
}

#[derive(Clone)]
pub struct ServiceProbe {
    runner: Arc<dyn CommandRunner>,
    toolchain: Toolchain,
}

impl ServiceProbe {
    pub fn new(runner: Arc<dyn CommandRunner>, toolchain: Toolchain) -> Self {
        Self { runner, toolchain }
    }

    /// Advisory only: a query that cannot run reports `Unknown` instead of failing.
    pub async fn status(&self, name: &str) -> ServiceStatus {
        let command = self.toolchain.status(name);
        match self.runner.run(&command).await {
            Ok(outcome) if outcome.stdout.contains(self.toolchain.running_marker()) => {
                ServiceStatus::Running
            }
            Ok(_) => ServiceStatus::Stopped,
            Err(e) => {
                tracing::warn!("Could not query {} status: {}", name, e);
                ServiceStatus::Unknown
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    AlreadyRunning,
    Started,
}

pub struct ServiceController {
    probe: ServiceProbe,
    runner: Arc<dyn CommandRunner>,
    toolchain: Toolchain,
    audit: Arc<dyn AuditSink>,
}

impl ServiceController {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        toolchain: Toolchain,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            probe: ServiceProbe::new(runner.clone(), toolchain.clone()),
            runner,
            toolchain,
            audit,
        }
    }

    pub fn probe(&self) -> &ServiceProbe {
        &self.probe
    }

    /// Starts the service unless the probe already sees it running.
    pub async fn ensure_started(&self, spec: &ServiceSpec) -> Result<StartOutcome, ServiceError> {
        if self.probe.status(&spec.name).await == ServiceStatus::Running {
            tracing::debug!("{} already running", spec.name);
            self.audit
                .record(AuditEntry::info(format!("{} service already running", spec.name)));
            return Ok(StartOutcome::AlreadyRunning);
        }

        let command = self.toolchain.start(spec);
        tracing::info!("Starting {} service", spec.name);
        let outcome = self
            .runner
            .run(&command)
            .await
            .map_err(|source| ServiceError::Launch {
                command: command.to_string(),
                source,
            })?;

        if !outcome.success() {
            return Err(ServiceError::Failed {
                service: spec.name.clone(),
                failure: CommandFailure::new(&command, outcome),
            });
        }

        let output = outcome.stdout.trim();
        if output.is_empty() {
            self.audit
                .record(AuditEntry::info(format!("Started {} service", spec.name)));
        } else {
            self.audit.record(AuditEntry::info(format!(
                "Started {} service: {}",
                spec.name, output
            )));
        }
        Ok(StartOutcome::Started)
    }
}
