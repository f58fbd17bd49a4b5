//! Config check command handler.

use anyhow::{Context, Result};

use opsdeck::config::validate::{validate_config, validate_effective, Diagnostic, DiagnosticLevel};
use opsdeck::config::Config;

use super::common::load_config;
use super::ConfigAction;

/// Validate the config file and the effective settings.
pub(crate) async fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Check => {
            let config_path = Config::path();
            println!("Config file: {}", config_path.display());

            let mut diagnostics = Vec::new();
            if !config_path.exists() {
                println!("[OK] No config file found (using defaults)");
            } else {
                let content = std::fs::read_to_string(&config_path)
                    .context("Failed to read config file")?;

                match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(raw) => diagnostics.extend(validate_config(&raw)),
                    Err(e) => {
                        println!("[ERROR] Invalid JSON: {}", e);
                        std::process::exit(1);
                    }
                }
            }

            let config = load_config()?;
            diagnostics.extend(validate_effective(&config));

            for diag in &diagnostics {
                println!("{}", diag);
            }

            let errors = count(&diagnostics, DiagnosticLevel::Error);
            let warnings = count(&diagnostics, DiagnosticLevel::Warn);

            if errors == 0 && warnings == 0 {
                println!("\nConfiguration looks good!");
            } else {
                println!("\nFound {} error(s), {} warning(s)", errors, warnings);
            }
            if errors > 0 {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn count(diagnostics: &[Diagnostic], level: DiagnosticLevel) -> usize {
    diagnostics.iter().filter(|d| d.level == level).count()
}
