//! Shell-script action executor.
//!
//! Runs the configured start/stop scripts through a shell on the host and
//! captures their output.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{ActionExecutor, CommandOutput};
use crate::config::ServersConfig;
use crate::error::{DeckError, Result};

/// Executes start/stop scripts with `shell <script>`.
///
/// `start` first rewrites line one of the start script to `cd <name>`, so the
/// script body runs inside the selected server's directory.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    start_script: Option<PathBuf>,
    stop_script: Option<PathBuf>,
    shell: String,
    timeout: Duration,
}

impl ScriptExecutor {
    pub fn new(start_script: Option<PathBuf>, stop_script: Option<PathBuf>) -> Self {
        Self {
            start_script,
            stop_script,
            shell: "bash".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(config: &ServersConfig) -> Self {
        Self::new(config.start_script_path(), config.stop_script_path())
            .with_shell(&config.shell)
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_shell(mut self, shell: &str) -> Self {
        self.shell = shell.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `script` and map a non-zero exit onto [`DeckError::External`]
    /// carrying the script's stderr verbatim.
    async fn run(&self, script: &Path) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(shell = %self.shell, script = %script.display(), "Running script");
        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                DeckError::External(format!(
                    "script timed out after {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let result = CommandOutput::new(
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code(),
        );
        if !result.success() {
            crate::log_component!(
                warn,
                "servers",
                "Script failed",
                exit_code = result.exit_code.unwrap_or(-1)
            );
            return Err(DeckError::External(result.stderr));
        }
        Ok(result)
    }
}

/// Replace the first line of the script with `cd <name>`.
///
/// An empty script is left untouched. The remaining lines keep their bytes.
pub fn point_script_at(script: &Path, name: &str) -> Result<()> {
    let content = std::fs::read_to_string(script)?;
    if content.is_empty() {
        return Ok(());
    }
    let rest = match content.find('\n') {
        Some(idx) => &content[idx + 1..],
        None => "",
    };
    std::fs::write(script, format!("cd {}\n{}", name, rest))?;
    Ok(())
}

fn configured<'a>(path: &'a Option<PathBuf>, which: &str) -> Result<&'a Path> {
    path.as_deref()
        .ok_or_else(|| DeckError::Config(format!("{} script is not configured", which)))
}

#[async_trait]
impl ActionExecutor for ScriptExecutor {
    async fn start(&self, name: &str) -> Result<CommandOutput> {
        let script = configured(&self.start_script, "start")?;
        point_script_at(script, name)?;
        info!(name = %name, script = %script.display(), "Starting server");
        self.run(script).await
    }

    async fn stop(&self, name: &str) -> Result<CommandOutput> {
        let script = configured(&self.stop_script, "stop")?;
        info!(name = %name, script = %script.display(), "Stopping server");
        self.run(script).await
    }
}
