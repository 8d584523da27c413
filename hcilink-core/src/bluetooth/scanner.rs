//! Device inquiry against the adapter interface.

use std::sync::Arc;

use crate::command::{CommandRunner, Toolchain};
use crate::device::{parse_inquiry_output, DeviceRecord};
use crate::error::{CommandFailure, ScanError};

pub struct DeviceScanner {
    runner: Arc<dyn CommandRunner>,
    toolchain: Toolchain,
}

impl DeviceScanner {
    pub fn new(runner: Arc<dyn CommandRunner>, toolchain: Toolchain) -> Self {
        Self { runner, toolchain }
    }

    /// Runs one inquiry. The adapter service must already be up.
    ///
    /// An empty result is a successful scan that found nothing.
    pub async fn scan(&self) -> Result<Vec<DeviceRecord>, ScanError> {
        let command = self.toolchain.inquiry();
        tracing::info!("Scanning for devices: {}", command);

        let outcome = self
            .runner
            .run(&command)
            .await
            .map_err(|source| ScanError::Launch {
                command: command.to_string(),
                source,
            })?;

        if !outcome.success() {
            return Err(ScanError::Failed(CommandFailure::new(&command, outcome)));
        }

        let devices = parse_inquiry_output(&outcome.stdout);
        tracing::info!("Inquiry returned {} entries", devices.len());
        Ok(devices)
    }
}
