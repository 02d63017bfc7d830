/// Core types and structures for the lizbox container
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Hostname the container sees inside its UTS namespace
pub const DEFAULT_HOSTNAME: &str = "container";
/// Mount point of the cgroup v2 unified hierarchy
pub const DEFAULT_CGROUP_ROOT: &str = "/sys/fs/cgroup";
/// Name of the shared cgroup node every container joins
pub const DEFAULT_CGROUP_NAME: &str = "liz";
/// Maximum number of processes inside one container
pub const DEFAULT_PIDS_MAX: u32 = 20;
/// Where the private procfs is mounted after the root transition
pub const PROC_MOUNT_POINT: &str = "/proc";
/// Exit status for usage errors and setup failures
pub const SETUP_FAILURE_EXIT_CODE: i32 = 1;

/// Cgroup settings for the resource group manager
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgroupConfig {
    /// Mount point of the cgroup hierarchy
    pub root: PathBuf,
    /// Node name below the root
    pub name: String,
    /// Value written to `pids.max`
    pub pids_max: u32,
}

impl Default for CgroupConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_CGROUP_ROOT),
            name: DEFAULT_CGROUP_NAME.to_string(),
            pids_max: DEFAULT_PIDS_MAX,
        }
    }
}

impl CgroupConfig {
    /// Full path of the cgroup node
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    /// Same settings under a per-launch name, so concurrent launches never share a node
    pub fn with_unique_name(&self) -> Self {
        Self {
            name: format!("{}-{}", self.name, uuid::Uuid::new_v4()),
            ..self.clone()
        }
    }
}

/// Container configuration shared by the launcher and the bootstrapper
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Hostname set inside the new UTS namespace
    pub hostname: String,
    /// Directory that becomes the container's root
    pub rootfs: PathBuf,
    /// Resource group settings
    pub cgroup: CgroupConfig,
    /// Kill the target after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            rootfs: PathBuf::from("/"),
            cgroup: CgroupConfig::default(),
            timeout_secs: None,
        }
    }
}

impl ContainerConfig {
    /// Load a configuration file; missing fields fall back to defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ContainerError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ContainerError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// The user's command: program followed by its arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    tokens: Vec<String>,
}

impl Invocation {
    /// Capture a command line; an empty one is a usage error
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(ContainerError::Usage("no command given".to_string()));
        }
        Ok(Self { tokens })
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// All tokens in their original order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Custom error types for lizbox
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cgroup error: {0}")]
    Cgroup(String),

    #[error("Namespace error: {0}")]
    Namespace(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for lizbox operations
pub type Result<T> = std::result::Result<T, ContainerError>;
