/*!
 * HCILINK Core
 * Bluetooth device discovery and connection through the host's HCI tools
 * Onyx Digital Intelligence Development LLC
 */

pub mod audit;
pub mod bluetooth;
pub mod command;
pub mod config;
pub mod device;
pub mod error;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::HciConfig;
pub use device::{BdAddr, DeviceRecord};
pub use error::{UserInputError, WorkflowError};
pub use service::ServiceStatus;
pub use workflow::{SharedWorkflow, Workflow, WorkflowState};
