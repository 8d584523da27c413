/*!
 * Scan / Connect orchestration
 * Brings services up in order, owns the current device list
 */

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::audit::{open_audit_log, AuditEntry, AuditSink};
use crate::bluetooth::{ConnectionRequester, DeviceScanner};
use crate::command::{CommandRunner, SystemRunner, Toolchain};
use crate::config::{HciConfig, ServiceSpec};
use crate::device::DeviceRecord;
use crate::error::{UserInputError, WorkflowError};
use crate::service::{ServiceController, ServiceProbe, ServiceStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Scanning,
    ScanFailed { diagnostic: String },
    ScanComplete,
    Connecting,
    Connected(DeviceRecord),
    ConnectFailed { diagnostic: String },
}

pub struct Workflow {
    services: Vec<ServiceSpec>,
    controller: ServiceController,
    scanner: DeviceScanner,
    requester: ConnectionRequester,
    audit: Arc<dyn AuditSink>,
    state: WorkflowState,
    // Replaced wholesale, never edited in place
    devices: Option<Arc<[DeviceRecord]>>,
}

impl Workflow {
    pub fn new(config: &HciConfig, runner: Arc<dyn CommandRunner>, audit: Arc<dyn AuditSink>) -> Self {
        let toolchain = Toolchain::new(&config.tools, &config.adapter);
        Self {
            services: config.services().cloned().collect(),
            controller: ServiceController::new(runner.clone(), toolchain.clone(), audit.clone()),
            scanner: DeviceScanner::new(runner.clone(), toolchain.clone()),
            requester: ConnectionRequester::new(runner, toolchain, config.adapter.connect_target),
            audit,
            state: WorkflowState::Idle,
            devices: None,
        }
    }

    /// Real host commands and the configured audit log.
    pub fn from_config(config: &HciConfig) -> Self {
        let runner = Arc::new(SystemRunner::new(config.command_timeout()));
        Self::new(config, runner, open_audit_log(&config.audit))
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Snapshot of the latest successful scan, `None` before one exists or after a failed rescan.
    pub fn devices(&self) -> Option<Arc<[DeviceRecord]>> {
        self.devices.clone()
    }

    pub fn audit(&self) -> &Arc<dyn AuditSink> {
        &self.audit
    }

    pub async fn scan(&mut self) -> Result<Arc<[DeviceRecord]>, WorkflowError> {
        self.state = WorkflowState::Scanning;
        self.devices = None;
        self.audit.record(AuditEntry::info("Scanning for Bluetooth devices"));

        match self.run_scan().await {
            Ok(found) => {
                let found: Arc<[DeviceRecord]> = found.into();
                self.audit.record(AuditEntry::info(format!(
                    "Scanned for Bluetooth devices, {} found",
                    found.len()
                )));
                self.devices = Some(found.clone());
                self.state = WorkflowState::ScanComplete;
                Ok(found)
            }
            Err(e) => {
                let diagnostic = e.to_string();
                tracing::error!("{}", diagnostic);
                self.audit.record(AuditEntry::error(diagnostic.clone()));
                self.state = WorkflowState::ScanFailed { diagnostic };
                Err(e)
            }
        }
    }

    async fn run_scan(&self) -> Result<Vec<DeviceRecord>, WorkflowError> {
        for service in &self.services {
            self.controller.ensure_started(service).await?;
        }
        Ok(self.scanner.scan().await?)
    }

    /// Connects to `selection`, which must come from the latest successful scan.
    pub async fn connect(
        &mut self,
        selection: Option<&DeviceRecord>,
    ) -> Result<DeviceRecord, WorkflowError> {
        let record = self.validate_selection(selection).map_err(|e| {
            self.audit.record(AuditEntry::info(match e {
                UserInputError::NoSelection => "No device selected for connection".to_string(),
                ref other => format!("Connect rejected: {}", other),
            }));
            WorkflowError::from(e)
        })?;

        self.state = WorkflowState::Connecting;
        self.audit
            .record(AuditEntry::info(format!("Connecting to {}", record)));

        match self.requester.connect(&record).await {
            Ok(()) => {
                self.audit
                    .record(AuditEntry::info(format!("Connected to {}", record)));
                self.state = WorkflowState::Connected(record.clone());
                Ok(record)
            }
            Err(e) => {
                let e = WorkflowError::from(e);
                let diagnostic = e.to_string();
                tracing::error!("{}", diagnostic);
                self.audit.record(AuditEntry::error(diagnostic.clone()));
                self.state = WorkflowState::ConnectFailed { diagnostic };
                Err(e)
            }
        }
    }

    fn validate_selection(&self, selection: Option<&DeviceRecord>) -> Result<DeviceRecord, UserInputError> {
        let devices = self
            .devices
            .as_ref()
            .ok_or(UserInputError::NoDevicesAvailable)?;
        let selected = selection.ok_or(UserInputError::NoSelection)?;

        devices
            .iter()
            .find(|d| d.raw == selected.raw)
            .cloned()
            .ok_or_else(|| UserInputError::UnknownDevice(selected.raw.clone()))
    }

    /// Looks up a record of the latest scan by raw line or address.
    pub fn find_device(&self, query: &str) -> Option<DeviceRecord> {
        let devices = self.devices.as_ref()?;
        let query = query.trim();
        devices
            .iter()
            .find(|d| {
                d.raw.trim() == query
                    || d.address.map(|a| a.to_string().eq_ignore_ascii_case(query)).unwrap_or(false)
            })
            .cloned()
    }

    /// Current status of every configured service, in start-up order.
    pub async fn service_report(&self) -> Vec<(String, ServiceStatus)> {
        self.service_reporter().report().await
    }

    pub fn service_reporter(&self) -> ServiceReporter {
        ServiceReporter {
            probe: self.controller.probe().clone(),
            names: self.services.iter().map(|s| s.name.clone()).collect(),
        }
    }
}

/// Read-only status queries; never waits on or blocks a running scan or connect.
#[derive(Clone)]
pub struct ServiceReporter {
    probe: ServiceProbe,
    names: Vec<String>,
}

impl ServiceReporter {
    pub async fn report(&self) -> Vec<(String, ServiceStatus)> {
        let mut report = Vec::with_capacity(self.names.len());
        for name in &self.names {
            report.push((name.clone(), self.probe.status(name).await));
        }
        report
    }
}

/// Shares one workflow between tasks; overlapping operations are rejected, not queued.
#[derive(Clone)]
pub struct SharedWorkflow {
    inner: Arc<Mutex<Workflow>>,
    reporter: ServiceReporter,
}

impl SharedWorkflow {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            reporter: workflow.service_reporter(),
            inner: Arc::new(Mutex::new(workflow)),
        }
    }

    pub async fn scan(&self) -> Result<Arc<[DeviceRecord]>, WorkflowError> {
        let mut workflow = self.inner.try_lock().map_err(|_| UserInputError::Busy)?;
        workflow.scan().await
    }

    pub async fn connect(&self, selection: Option<DeviceRecord>) -> Result<DeviceRecord, WorkflowError> {
        let mut workflow = self.inner.try_lock().map_err(|_| UserInputError::Busy)?;
        workflow.connect(selection.as_ref()).await
    }

    /// Answers even while a scan or connect holds the workflow.
    pub async fn service_report(&self) -> Vec<(String, ServiceStatus)> {
        self.reporter.report().await
    }

    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
