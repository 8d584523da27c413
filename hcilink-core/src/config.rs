use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HciConfig {
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Left out of the file, the security daemon step is skipped entirely.
    pub security_daemon: Option<ServiceSpec>,
    #[serde(default = "default_adapter_service")]
    pub adapter_service: ServiceSpec,
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Prefix for privileged commands; empty runs them directly.
    pub privileged_runner: String,
    pub status_tool: String,
    pub start_tool: String,
    pub control_tool: String,
    pub running_marker: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceSpec {
    pub name: String,
    pub start_variant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub interface: String,
    pub inquiry_subcommand: InquirySubcommand,
    pub connect_target: ConnectTarget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InquirySubcommand {
    Inquiry,
    List,
}

impl InquirySubcommand {
    pub fn as_str(self) -> &'static str {
        match self {
            InquirySubcommand::Inquiry => "inquiry",
            InquirySubcommand::List => "list",
        }
    }
}

/// What `create_connection` receives for a selected record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectTarget {
    /// The inquiry line exactly as the tool printed it.
    Raw,
    /// Only the extracted device address, falling back to the raw line.
    Address,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            privileged_runner: "sudo".to_string(),
            status_tool: "service".to_string(),
            start_tool: "service".to_string(),
            control_tool: "hccontrol".to_string(),
            running_marker: "is running".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            interface: "ubt0hci".to_string(),
            inquiry_subcommand: InquirySubcommand::Inquiry,
            connect_target: ConnectTarget::Raw,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("bluetooth_manager.log"),
        }
    }
}

fn default_adapter_service() -> ServiceSpec {
    ServiceSpec {
        name: "bluetooth".to_string(),
        start_variant: "onestart".to_string(),
        arg: Some("ubt0".to_string()),
    }
}

impl Default for HciConfig {
    fn default() -> Self {
        Self {
            tools: ToolsConfig::default(),
            security_daemon: Some(ServiceSpec {
                name: "hcsecd".to_string(),
                start_variant: "onestart".to_string(),
                arg: None,
            }),
            adapter_service: default_adapter_service(),
            adapter: AdapterConfig::default(),
            audit: AuditConfig::default(),
        }
    }
}

impl HciConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)?,
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(ConfigError::Read {
                    path: path.to_string(),
                    source: e,
                })
            }
            Err(_) => {
                // Create default config if not found
                let config = Self::default();
                if let Err(e) = fs::write(path, toml::to_string_pretty(&config)?) {
                    tracing::debug!("Could not write default config to {}: {}", path, e);
                }
                config
            }
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.tools.timeout_secs)
    }

    /// Services in the order a scan must bring them up.
    pub fn services(&self) -> impl Iterator<Item = &ServiceSpec> {
        self.security_daemon.iter().chain(std::iter::once(&self.adapter_service))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("tools.status_tool", &self.tools.status_tool),
            ("tools.start_tool", &self.tools.start_tool),
            ("tools.control_tool", &self.tools.control_tool),
            ("tools.running_marker", &self.tools.running_marker),
            ("adapter.interface", &self.adapter.interface),
            ("adapter_service.name", &self.adapter_service.name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }

        if let Some(daemon) = &self.security_daemon {
            if daemon.name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "security_daemon.name must not be empty".to_string(),
                ));
            }
        }

        if self.tools.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "tools.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_a_toml_round_trip() {
        let text = toml::to_string_pretty(&HciConfig::default()).unwrap();
        let config = HciConfig::from_toml(&text).unwrap();

        assert_eq!(config.security_daemon.as_ref().unwrap().name, "hcsecd");
        assert_eq!(config.adapter_service.arg.as_deref(), Some("ubt0"));
        assert_eq!(config.adapter.inquiry_subcommand, InquirySubcommand::Inquiry);
        config.validate().unwrap();
    }

    #[test]
    fn omitting_security_daemon_skips_that_step() {
        let config = HciConfig::from_toml(
            r#"
            [adapter]
            inquiry_subcommand = "list"
            "#,
        )
        .unwrap();

        assert!(config.security_daemon.is_none());
        assert_eq!(config.adapter.inquiry_subcommand, InquirySubcommand::List);
        let names: Vec<_> = config.services().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["bluetooth"]);
    }

    #[test]
    fn services_come_up_daemon_first() {
        let config = HciConfig::default();
        let names: Vec<_> = config.services().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["hcsecd", "bluetooth"]);
    }

    #[test]
    fn validate_rejects_empty_interface() {
        let mut config = HciConfig::default();
        config.adapter.interface = " ".to_string();

        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("adapter.interface"));
    }

    #[test]
    fn load_refuses_a_path_it_cannot_read() {
        let dir = std::env::temp_dir().join(format!("hcilink-config-dir-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let result = HciConfig::load(dir.to_str().unwrap());

        assert!(matches!(result, Err(ConfigError::Read { .. })));
        assert!(dir.is_dir());
        let _ = fs::remove_dir(&dir);
    }

    #[test]
    fn load_falls_back_to_defaults_for_missing_file() {
        let path = std::env::temp_dir().join(format!(
            "hcilink-missing-{}/hcilink.toml",
            std::process::id()
        ));
        let config = HciConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.tools.control_tool, "hccontrol");
    }
}
