//! Configuration management for OpsDeck
//!
//! Configuration is loaded from `~/.opsdeck/config.json` with environment
//! variable overrides. A missing file yields the defaults.

mod types;
pub mod validate;

pub use types::*;

use crate::error::Result;
use std::path::{Path, PathBuf};

impl Config {
    /// Returns the OpsDeck configuration directory path (~/.opsdeck)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".opsdeck")
    }

    /// Returns the path to the config file (~/.opsdeck/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// Environment variables override config values using the pattern
    /// `OPSDECK_SECTION_KEY`.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Legacy names (`FIXED_KEY`, `START_PATH`, `STOP_PATH`) are honoured but
    /// lose to their `OPSDECK_*` counterparts.
    fn apply_env_overrides(&mut self) {
        // Auth
        if let Ok(val) = std::env::var("FIXED_KEY") {
            self.auth.fixed_key = val;
        }
        if let Ok(val) = std::env::var("OPSDECK_AUTH_FIXED_KEY") {
            self.auth.fixed_key = val;
        }
        if let Ok(val) = std::env::var("OPSDECK_AUTH_REFERENCE_FILE") {
            self.auth.reference_file = val;
        }

        // Registry
        if let Ok(val) = std::env::var("OPSDECK_REGISTRY_PATH") {
            self.registry.path = val;
        }

        // Probe
        if let Ok(val) = std::env::var("OPSDECK_PROBE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                self.probe.timeout_secs = v;
            }
        }
        if let Ok(val) = std::env::var("OPSDECK_PROBE_INTERVAL_SECS") {
            if let Ok(v) = val.parse() {
                self.probe.interval_secs = v;
            }
        }

        // Servers
        if let Ok(val) = std::env::var("START_PATH") {
            self.servers.start_script = Some(val);
        }
        if let Ok(val) = std::env::var("OPSDECK_SERVERS_START_SCRIPT") {
            self.servers.start_script = Some(val);
        }
        if let Ok(val) = std::env::var("STOP_PATH") {
            self.servers.stop_script = Some(val);
        }
        if let Ok(val) = std::env::var("OPSDECK_SERVERS_STOP_SCRIPT") {
            self.servers.stop_script = Some(val);
        }
    }
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_home(path: &str) -> PathBuf {
    if path.is_empty() {
        return PathBuf::from(path);
    }

    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            if path.len() > 1 && path.chars().nth(1) == Some('/') {
                return home.join(&path[2..]);
            }
            return home;
        }
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.registry.seed_name, "homepage");
        assert_eq!(config.registry.seed_url, "https://torinwolff.com");
        assert_eq!(config.probe.timeout_secs, 10);
        assert_eq!(config.servers.shell, "bash");
        assert!(config.servers.start_script.is_none());
        assert!(config.auth.fixed_key.is_empty());
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{"probe": {"timeout_secs": 3}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.probe.timeout_secs, 3);
        assert_eq!(config.probe.interval_secs, 300); // Default
        assert_eq!(config.registry.seed_name, "homepage"); // Default
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();

        assert_eq!(expand_home("~/.opsdeck"), home.join(".opsdeck"));
        assert_eq!(expand_home("~"), home);
        assert_eq!(
            expand_home("/absolute/path"),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
        assert_eq!(expand_home(""), PathBuf::from(""));
    }

    #[test]
    fn test_default_paths_live_under_config_dir() {
        let config = Config::default();
        assert_eq!(
            config.registry.path(),
            Config::dir().join("instances").join("websites.csv")
        );
        assert_eq!(
            config.auth.reference_path(),
            Config::dir().join("encrypted_strings.txt")
        );
        assert_eq!(Config::path(), Config::dir().join("config.json"));
    }

    #[test]
    fn test_script_paths_ignore_blank() {
        let mut config = Config::default();
        config.servers.start_script = Some("  ".to_string());
        config.servers.stop_script = Some("/srv/stop.sh".to_string());
        assert!(config.servers.start_script_path().is_none());
        assert_eq!(
            config.servers.stop_script_path(),
            Some(PathBuf::from("/srv/stop.sh"))
        );
    }

    #[test]
    fn test_auth_debug_redacts_key() {
        let mut config = Config::default();
        assert!(format!("{:?}", config.auth).contains("<unset>"));
        config.auth.fixed_key = "MyFixedBlowfishKey123456".to_string();
        let rendered = format!("{:?}", config.auth);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("MyFixedBlowfishKey123456"));
    }

    // All env mutations live in one test; the process environment is shared
    // between test threads.
    #[test]
    fn test_env_overrides() {
        env::set_var("FIXED_KEY", "legacy-key");
        env::set_var("START_PATH", "/legacy/start.sh");
        env::set_var("OPSDECK_SERVERS_START_SCRIPT", "/new/start.sh");
        env::set_var("OPSDECK_PROBE_TIMEOUT_SECS", "4");
        env::set_var("OPSDECK_PROBE_INTERVAL_SECS", "not-a-number");
        env::set_var("OPSDECK_REGISTRY_PATH", "/tmp/sites.csv");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.auth.fixed_key, "legacy-key");
        assert_eq!(config.servers.start_script.as_deref(), Some("/new/start.sh"));
        assert_eq!(config.probe.timeout_secs, 4);
        assert_eq!(config.probe.interval_secs, 300);
        assert_eq!(config.registry.path(), PathBuf::from("/tmp/sites.csv"));

        env::set_var("OPSDECK_AUTH_FIXED_KEY", "new-key");
        config.apply_env_overrides();
        assert_eq!(config.auth.fixed_key, "new-key");

        for key in [
            "FIXED_KEY",
            "START_PATH",
            "OPSDECK_SERVERS_START_SCRIPT",
            "OPSDECK_PROBE_TIMEOUT_SECS",
            "OPSDECK_PROBE_INTERVAL_SECS",
            "OPSDECK_REGISTRY_PATH",
            "OPSDECK_AUTH_FIXED_KEY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"probe": {"user_agent": "probe-test"}, "servers": {"timeout_secs": 30}}"#,
        )
        .unwrap();

        let loaded = Config::load_from_path(&config_path).unwrap();
        assert_eq!(loaded.probe.user_agent, "probe-test");
        assert_eq!(loaded.servers.timeout_secs, 30);
        assert_eq!(loaded.servers.shell, "bash");
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.json");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.servers.shell, "bash");
    }

    #[test]
    fn test_load_malformed_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(crate::error::DeckError::Json(_))
        ));
    }
}
