//! Configuration type definitions for OpsDeck
//!
//! Every section implements serde traits for JSON serialization and has
//! defaults, so a partial (or missing) config file is always valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::expand_home;

/// Main configuration struct for OpsDeck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operator login (reference file, fixed key)
    pub auth: AuthConfig,
    /// Endpoint registry storage
    pub registry: RegistryConfig,
    /// Liveness probing
    pub probe: ProbeConfig,
    /// Start/stop scripts
    pub servers: ServersConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

// ============================================================================
// Auth Configuration
// ============================================================================

/// Credential verification settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Two-line file holding the transformed identity and secret.
    pub reference_file: String,
    /// Blowfish key shared with whoever produced the reference file.
    pub fixed_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reference_file: "~/.opsdeck/encrypted_strings.txt".to_string(),
            fixed_key: String::new(),
        }
    }
}

impl AuthConfig {
    pub fn reference_path(&self) -> PathBuf {
        expand_home(&self.reference_file)
    }
}

// The key never goes to logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.fixed_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("AuthConfig")
            .field("reference_file", &self.reference_file)
            .field("fixed_key", &key)
            .finish()
    }
}

// ============================================================================
// Registry Configuration
// ============================================================================

/// Registry store location and the record written on first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// CSV file path (`~` is expanded).
    pub path: String,
    /// Name of the seed record.
    pub seed_name: String,
    /// Endpoint of the seed record.
    pub seed_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: "~/.opsdeck/instances/websites.csv".to_string(),
            seed_name: "homepage".to_string(),
            seed_url: "https://torinwolff.com".to_string(),
        }
    }
}

impl RegistryConfig {
    pub fn path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

// ============================================================================
// Probe Configuration
// ============================================================================

/// HTTP liveness probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Default interval for `sites watch`, in seconds.
    pub interval_secs: u64,
    /// User-Agent header sent with every probe.
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            interval_secs: 300,
            user_agent: format!("opsdeck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ============================================================================
// Servers Configuration
// ============================================================================

/// Start/stop script settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServersConfig {
    /// Script run by `server start`; its first line is rewritten per call.
    pub start_script: Option<String>,
    /// Script run by `server stop`.
    pub stop_script: Option<String>,
    /// Interpreter used to run both scripts.
    pub shell: String,
    /// Kill a script that runs longer than this many seconds.
    pub timeout_secs: u64,
}

impl Default for ServersConfig {
    fn default() -> Self {
        Self {
            start_script: None,
            stop_script: None,
            shell: "bash".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ServersConfig {
    pub fn start_script_path(&self) -> Option<PathBuf> {
        script_path(&self.start_script)
    }

    pub fn stop_script_path(&self) -> Option<PathBuf> {
        script_path(&self.stop_script)
    }
}

fn script_path(raw: &Option<String>) -> Option<PathBuf> {
    raw.as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(expand_home)
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Compact single-line output; pair with `log_component!`
    #[default]
    Component,
    /// JSON lines
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter level; `RUST_LOG` takes precedence.
    pub level: String,
    /// Optional file for JSON output.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            file: None,
        }
    }
}
