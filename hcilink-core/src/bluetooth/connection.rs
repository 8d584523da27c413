//! Connection requests for previously discovered devices.

use std::sync::Arc;

use crate::command::{CommandRunner, Toolchain};
use crate::config::ConnectTarget;
use crate::device::DeviceRecord;
use crate::error::{CommandFailure, ConnectionError};

pub struct ConnectionRequester {
    runner: Arc<dyn CommandRunner>,
    toolchain: Toolchain,
    target: ConnectTarget,
}

impl ConnectionRequester {
    pub fn new(runner: Arc<dyn CommandRunner>, toolchain: Toolchain, target: ConnectTarget) -> Self {
        Self {
            runner,
            toolchain,
            target,
        }
    }

    /// Argument handed to `create_connection` for this record.
    pub fn target_for(&self, record: &DeviceRecord) -> String {
        match (self.target, record.address) {
            (ConnectTarget::Address, Some(address)) => address.to_string(),
            _ => record.raw.clone(),
        }
    }

    /// Membership in the latest scan is the caller's job.
    pub async fn connect(&self, record: &DeviceRecord) -> Result<(), ConnectionError> {
        let command = self.toolchain.create_connection(&self.target_for(record));
        tracing::info!("Connecting to device: {}", record);

        let outcome = self
            .runner
            .run(&command)
            .await
            .map_err(|source| ConnectionError::Launch {
                command: command.to_string(),
                source,
            })?;

        if !outcome.success() {
            return Err(ConnectionError::Failed(CommandFailure::new(&command, outcome)));
        }

        Ok(())
    }
}
