// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Guard Configuration Types
//
// Startup configuration for the remoting guard:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Additional denylist entries on top of the built-in list
// - Role-check enforcement switch and bypass allowlist
// - Name/value overrides read once at startup (process environment)

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::policy::{OperationType, DEFAULT_REMEDIATION_URL};

pub const API_VERSION: &str = "remoting-guard/v1";
pub const KIND: &str = "GuardConfig";

/// Explicit config file path
pub const ENV_CONFIG_PATH: &str = "REMOTING_GUARD_CONFIG_PATH";
/// Comma-separated operation types to reject in addition to the built-ins
pub const ENV_ADDITIONAL_DENYLIST: &str = "REMOTING_GUARD_ADDITIONAL_DENYLIST";
/// Boolean: disable role-check enforcement for all operations
pub const ENV_DISABLE_ROLE_CHECK: &str = "REMOTING_GUARD_DISABLE_ROLE_CHECK";
/// Comma-separated operation types allowed to skip scope declaration
pub const ENV_ROLE_CHECK_BYPASS: &str = "REMOTING_GUARD_ROLE_CHECK_BYPASS";

/// Name/value lookup used for startup overrides.
pub trait ConfigSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads overrides from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Top-level guard configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// API version (must be "remoting-guard/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GuardConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: GuardSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSpec {
    #[serde(default)]
    pub denylist: DenylistConfig,

    #[serde(default)]
    pub role_check: RoleCheckConfig,

    /// Remediation reference included in every rejection message
    #[serde(default = "default_remediation_url")]
    pub remediation_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DenylistConfig {
    /// Operation types rejected in addition to the built-in list
    #[serde(default, deserialize_with = "lenient_operation_types")]
    pub additional: Vec<OperationType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleCheckConfig {
    /// Allow every operation through the role check, declared or not
    #[serde(default)]
    pub disable_all: bool,

    /// Operation types allowed to skip scope declaration
    #[serde(default, deserialize_with = "lenient_operation_types")]
    pub bypass: Vec<OperationType>,
}

fn default_remediation_url() -> String {
    DEFAULT_REMEDIATION_URL.to_string()
}

// Blank entries are dropped rather than failing the whole file.
fn lenient_operation_types<'de, D>(deserializer: D) -> Result<Vec<OperationType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .filter_map(|entry| OperationType::parse(entry).ok())
        .collect())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for GuardSpec {
    fn default() -> Self {
        Self {
            denylist: DenylistConfig::default(),
            role_check: RoleCheckConfig::default(),
            remediation_url: default_remediation_url(),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "remoting-guard".to_string(),
                labels: None,
            },
            spec: GuardSpec::default(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. REMOTING_GUARD_CONFIG_PATH
    /// 2. ./remoting-guard.yaml (working directory)
    /// 3. ~/.remoting-guard/config.yaml (user home)
    /// 4. /etc/remoting-guard/config.yaml (Unix) or
    ///    C:\ProgramData\RemotingGuard\config.yaml (Windows)
    pub fn discover_config(source: &impl ConfigSource) -> Option<PathBuf> {
        if let Some(path) = source.get(ENV_CONFIG_PATH) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./remoting-guard.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".remoting-guard").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/remoting-guard/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\RemotingGuard\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default, then apply
    /// process environment overrides
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        Self::load_with(cli_path, &EnvSource)
    }

    pub fn load_with(
        cli_path: Option<PathBuf>,
        source: &impl ConfigSource,
    ) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_overrides(source);
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config(source) {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_overrides(source);
        Ok(config)
    }

    /// Apply name/value overrides. Malformed values are logged and ignored.
    pub fn apply_overrides(&mut self, source: &impl ConfigSource) {
        if let Some(raw) = source.get(ENV_ADDITIONAL_DENYLIST) {
            let entries = OperationType::parse_list(&raw);
            tracing::info!("Startup override: {}={}", ENV_ADDITIONAL_DENYLIST, raw);
            extend_unique(&mut self.spec.denylist.additional, entries);
        }

        if let Some(raw) = source.get(ENV_DISABLE_ROLE_CHECK) {
            match parse_bool(&raw) {
                Some(value) => {
                    tracing::info!("Startup override: {}={}", ENV_DISABLE_ROLE_CHECK, value);
                    self.spec.role_check.disable_all = value;
                }
                None => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                        ENV_DISABLE_ROLE_CHECK,
                        raw
                    );
                }
            }
        }

        if let Some(raw) = source.get(ENV_ROLE_CHECK_BYPASS) {
            let entries = OperationType::parse_list(&raw);
            tracing::info!("Startup override: {}={}", ENV_ROLE_CHECK_BYPASS, raw);
            extend_unique(&mut self.spec.role_check.bypass, entries);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.remediation_url.trim().is_empty() {
            anyhow::bail!("spec.remediation_url cannot be empty");
        }

        Ok(())
    }
}

fn extend_unique(target: &mut Vec<OperationType>, entries: Vec<OperationType>) {
    for entry in entries {
        if !target.contains(&entry) {
            target.push(entry);
        }
    }
}
