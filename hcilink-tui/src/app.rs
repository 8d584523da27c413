use hcilink_core::{DeviceRecord, ServiceStatus, SharedWorkflow, UserInputError, WorkflowError};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Dialog {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Dialog {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        let title = match severity {
            Severity::Info => "Success",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        Self {
            severity,
            title: title.to_string(),
            message: message.into(),
        }
    }

    fn from_error(error: &WorkflowError) -> Self {
        let severity = if error.is_user_error() {
            Severity::Warning
        } else {
            Severity::Error
        };
        Self::new(severity, error.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Scanning,
    Connecting,
}

/// Results coming back from background operations.
pub enum AppEvent {
    ScanFinished(Result<Arc<[DeviceRecord]>, WorkflowError>),
    ConnectFinished(Result<DeviceRecord, WorkflowError>),
    ServicesProbed(Vec<(String, ServiceStatus)>),
}

pub struct App {
    /// Copy of the last successful scan; `None` before one or after a failed rescan.
    pub devices: Option<Arc<[DeviceRecord]>>,
    pub selected_device: usize,
    pub services: Vec<(String, ServiceStatus)>,
    pub connected: Option<DeviceRecord>,
    pub activity: Option<Activity>,
    pub dialog: Option<Dialog>,
    workflow: SharedWorkflow,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(workflow: SharedWorkflow) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let app = Self {
            devices: None,
            selected_device: 0,
            services: Vec::new(),
            connected: None,
            activity: None,
            dialog: None,
            workflow,
            events_tx,
            events_rx,
        };

        app.refresh_services();
        app
    }

    pub fn previous_device(&mut self) {
        let len = self.device_count();
        if len > 0 {
            self.selected_device = if self.selected_device == 0 {
                len - 1
            } else {
                self.selected_device - 1
            };
        }
    }

    pub fn next_device(&mut self) {
        let len = self.device_count();
        if len > 0 {
            self.selected_device = (self.selected_device + 1) % len;
        }
    }

    pub fn dismiss_dialog(&mut self) {
        self.dialog = None;
    }

    pub fn device_count(&self) -> usize {
        self.devices.as_ref().map_or(0, |d| d.len())
    }

    pub fn get_selected_device(&self) -> Option<&DeviceRecord> {
        self.devices.as_ref()?.get(self.selected_device)
    }

    pub fn start_scan(&mut self) {
        let workflow = self.workflow.clone();
        let tx = self.events_tx.clone();
        if !self.workflow.is_busy() {
            self.activity = Some(Activity::Scanning);
        }

        tokio::spawn(async move {
            let result = workflow.scan().await;
            let _ = tx.send(AppEvent::ScanFinished(result));
        });
    }

    pub fn start_connect(&mut self) {
        let workflow = self.workflow.clone();
        let tx = self.events_tx.clone();
        let selection = self.get_selected_device().cloned();
        if !self.workflow.is_busy() {
            self.activity = Some(Activity::Connecting);
        }

        tokio::spawn(async move {
            let result = workflow.connect(selection).await;
            let _ = tx.send(AppEvent::ConnectFinished(result));
        });
    }

    pub fn refresh_services(&self) {
        let workflow = self.workflow.clone();
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let report = workflow.service_report().await;
            let _ = tx.send(AppEvent::ServicesProbed(report));
        });
    }

    /// Applies every finished background operation.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ScanFinished(result) => {
                self.finish_activity(result.as_ref().err());
                match result {
                    Ok(devices) => {
                        if devices.is_empty() {
                            self.dialog = Some(Dialog::new(Severity::Info, "No devices found"));
                        }
                        self.devices = Some(devices);
                        self.selected_device = 0;
                        self.connected = None;
                        self.refresh_services();
                    }
                    Err(WorkflowError::UserInput(e)) => {
                        self.dialog = Some(Dialog::from_error(&e.into()));
                    }
                    Err(e) => {
                        self.devices = None;
                        self.selected_device = 0;
                        self.connected = None;
                        self.dialog = Some(Dialog::from_error(&e));
                    }
                }
            }
            AppEvent::ConnectFinished(result) => {
                self.finish_activity(result.as_ref().err());
                match result {
                    Ok(device) => {
                        self.dialog = Some(Dialog::new(
                            Severity::Info,
                            format!("Connected to {}", device),
                        ));
                        self.connected = Some(device);
                    }
                    Err(e) => self.dialog = Some(Dialog::from_error(&e)),
                }
            }
            AppEvent::ServicesProbed(report) => self.services = report,
        }
    }

    // A rejected overlapping request must not end the activity that is still running
    fn finish_activity(&mut self, error: Option<&WorkflowError>) {
        let rejected_as_busy = matches!(
            error,
            Some(WorkflowError::UserInput(UserInputError::Busy))
        );
        if !rejected_as_busy {
            self.activity = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcilink_core::audit::NullAuditLog;
    use hcilink_core::error::{CommandFailure, ScanError};
    use hcilink_core::{HciConfig, Workflow};

    fn app() -> App {
        let config = HciConfig::default();
        // Commands are never awaited in these tests; events are injected directly
        let workflow = Workflow::new(
            &config,
            Arc::new(hcilink_core::command::SystemRunner::new(config.command_timeout())),
            Arc::new(NullAuditLog),
        );
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        App {
            devices: None,
            selected_device: 0,
            services: Vec::new(),
            connected: None,
            activity: None,
            dialog: None,
            workflow: SharedWorkflow::new(workflow),
            events_tx,
            events_rx,
        }
    }

    fn devices() -> Arc<[DeviceRecord]> {
        vec![
            DeviceRecord::from_line("00:11:22:33:44:55 DeviceA"),
            DeviceRecord::from_line("66:77:88:99:AA:BB DeviceB"),
        ]
        .into()
    }

    fn scan_failure() -> WorkflowError {
        ScanError::Failed(CommandFailure {
            command: "sudo hccontrol -n ubt0hci inquiry".to_string(),
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "no such interface".to_string(),
        })
        .into()
    }

    #[test]
    fn selection_wraps_around() {
        let mut app = app();
        app.devices = Some(devices());

        app.previous_device();
        assert_eq!(app.selected_device, 1);
        app.next_device();
        assert_eq!(app.selected_device, 0);
        assert_eq!(
            app.get_selected_device().map(|d| d.raw.as_str()),
            Some("00:11:22:33:44:55 DeviceA")
        );
    }

    #[test]
    fn failed_scan_clears_the_displayed_list() {
        let mut app = app();
        app.devices = Some(devices());
        app.selected_device = 1;
        app.activity = Some(Activity::Scanning);

        app.handle_event(AppEvent::ScanFinished(Err(scan_failure())));

        assert!(app.devices.is_none());
        assert_eq!(app.activity, None);
        let dialog = app.dialog.unwrap();
        assert_eq!(dialog.severity, Severity::Error);
        assert!(dialog.message.contains("no such interface"));
    }

    #[tokio::test]
    async fn empty_scan_reports_no_devices() {
        let mut app = app();
        app.activity = Some(Activity::Scanning);

        app.handle_event(AppEvent::ScanFinished(Ok(Vec::new().into())));

        assert_eq!(app.activity, None);
        assert_eq!(app.device_count(), 0);
        assert!(app.devices.is_some());
        assert!(app.get_selected_device().is_none());
        let dialog = app.dialog.unwrap();
        assert_eq!(dialog.severity, Severity::Info);
        assert_eq!(dialog.message, "No devices found");
    }

    #[tokio::test]
    async fn successful_scan_replaces_list_and_resets_selection() {
        let mut app = app();
        app.devices = Some(
            vec![
                DeviceRecord::from_line("AA:BB:CC:DD:EE:FF DeviceC"),
                DeviceRecord::from_line("AA:BB:CC:DD:EE:00 DeviceD"),
            ]
            .into(),
        );
        app.selected_device = 1;
        app.connected = app.get_selected_device().cloned();
        app.activity = Some(Activity::Scanning);

        app.handle_event(AppEvent::ScanFinished(Ok(devices())));

        assert_eq!(app.activity, None);
        assert_eq!(app.device_count(), 2);
        assert_eq!(app.selected_device, 0);
        assert_eq!(app.connected, None);
        assert!(app.dialog.is_none());
        assert_eq!(
            app.get_selected_device().map(|d| d.raw.as_str()),
            Some("00:11:22:33:44:55 DeviceA")
        );
    }

    #[test]
    fn busy_rejection_keeps_list_and_activity() {
        let mut app = app();
        app.devices = Some(devices());
        app.activity = Some(Activity::Scanning);

        app.handle_event(AppEvent::ScanFinished(Err(UserInputError::Busy.into())));

        assert_eq!(app.device_count(), 2);
        assert_eq!(app.activity, Some(Activity::Scanning));
        assert_eq!(app.dialog.unwrap().severity, Severity::Warning);
    }

    #[test]
    fn connect_outcomes_pick_dialog_severity() {
        let mut app = app();
        app.devices = Some(devices());

        app.handle_event(AppEvent::ConnectFinished(Err(UserInputError::NoSelection.into())));
        assert_eq!(app.dialog.take().unwrap().severity, Severity::Warning);

        let device = devices()[0].clone();
        app.handle_event(AppEvent::ConnectFinished(Ok(device.clone())));
        let dialog = app.dialog.take().unwrap();
        assert_eq!(dialog.severity, Severity::Info);
        assert_eq!(dialog.message, "Connected to 00:11:22:33:44:55 DeviceA");
        assert_eq!(app.connected, Some(device));
        assert_eq!(app.device_count(), 2);
    }
}
