//! Sampler configuration.
//!
//! Supplied once at construction. Every field has a default, so a config file
//! only needs the options it changes:
//!
//! ```json
//! { "tcp": true, "disks": ["sda"], "labels": { "cluster": "prod" } }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Options recognized by [`crate::Sampler`].
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// CPU count and utilization.
    pub cpu: bool,
    /// Emit CPU percentage buckets (requires `cpu`).
    pub cpu_percent: bool,
    /// Memory and swap usage.
    pub mem: bool,
    /// Disk I/O rates.
    pub disk: bool,
    /// Network interface rates.
    pub net: bool,
    /// TCP segment counters.
    pub protocol: bool,
    /// TCP socket state counts (requires `protocol`).
    pub tcp: bool,
    /// System-wide file handle usage.
    pub open_fd: bool,
    /// Disk names to collect. Empty means all.
    pub disks: Vec<String>,
    /// Network interface names to collect. Empty means all.
    pub net_interfaces: Vec<String>,
    /// Static labels added to every metric.
    pub labels: BTreeMap<String, String>,
    /// Regex; disks whose mount filesystem type matches are skipped.
    pub exclude_disk_fs_type: Option<String>,
    /// Regex; disks whose device path (`/dev/<name>`) matches are skipped.
    pub exclude_disk_path: Option<String>,
    /// Value of the `ip` label. Resolved from the hostname when unset.
    pub host_ip: Option<String>,
    /// CPU quota in millicores; scales CPU percentages when valid.
    pub cpu_request: Option<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            cpu: true,
            cpu_percent: true,
            mem: true,
            disk: true,
            net: true,
            protocol: true,
            tcp: false,
            open_fd: true,
            disks: Vec::new(),
            net_interfaces: Vec::new(),
            labels: BTreeMap::new(),
            exclude_disk_fs_type: None,
            exclude_disk_path: None,
            host_ip: None,
            cpu_request: None,
        }
    }
}

impl SamplerConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Error raised while building a sampler. Never retried.
#[derive(Debug)]
pub enum ConfigError {
    /// An exclude pattern does not compile.
    InvalidPattern {
        option: &'static str,
        pattern: String,
        message: String,
    },
    /// Config file could not be read.
    Io(std::io::Error),
    /// Config file is not valid JSON for [`SamplerConfig`].
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPattern {
                option,
                pattern,
                message,
            } => write!(f, "invalid {} pattern '{}': {}", option, pattern, message),
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
