use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during config operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

/// Cluster detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSettings {
    /// Node name prefix identifying a k3d cluster
    #[serde(default = "default_node_prefix")]
    pub node_prefix: String,
    /// Namespace used when the kubeconfig context does not name one
    #[serde(default = "default_namespace")]
    pub fallback_namespace: String,
}

fn default_node_prefix() -> String {
    "k3d".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            node_prefix: default_node_prefix(),
            fallback_namespace: default_namespace(),
        }
    }
}

/// How a bare pod name (no container given) picks its container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerSelection {
    /// Use the first container declared in the pod spec
    #[default]
    FirstDeclared,
    /// Refuse bare pod names; a container must always be named
    RequireName,
}

/// Target resolution settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetSettings {
    #[serde(default)]
    pub container_selection: ContainerSelection,
}

/// Low-level container runtime invoked on the node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Runtime binary available inside the node
    #[serde(default = "default_runtime_binary")]
    pub binary: String,
    /// State root the runtime uses for Kubernetes containers
    #[serde(default = "default_runtime_root")]
    pub root: String,
    /// Command run when none is given
    #[serde(default = "default_shell")]
    pub default_shell: String,
}

fn default_runtime_binary() -> String {
    "runc".to_string()
}

fn default_runtime_root() -> String {
    "/run/containerd/runc/k8s.io/".to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            binary: default_runtime_binary(),
            root: default_runtime_root(),
            default_shell: default_shell(),
        }
    }
}

/// Docker engine connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerSettings {
    /// Engine endpoint (`unix://...`, `tcp://...`, `http://...`).
    /// None uses `DOCKER_HOST` or the platform's local socket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Tool configuration, stored as JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cluster: ClusterSettings,

    #[serde(default)]
    pub target: TargetSettings,

    #[serde(default)]
    pub runtime: RuntimeSettings,

    #[serde(default)]
    pub docker: DockerSettings,
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        Ok(dirs::config_dir()
            .ok_or(ConfigError::ConfigDirNotFound)?
            .join("k3droot"))
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific file, falling back to defaults
    /// when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;

        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}
