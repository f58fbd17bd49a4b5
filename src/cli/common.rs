//! Shared CLI helpers used across multiple command handlers.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use opsdeck::auth::{CredentialDigest, CredentialVerifier};
use opsdeck::config::Config;
use opsdeck::registry::{HttpProber, Record, RegistryStore};
use opsdeck::servers::{ScriptExecutor, ServerController};

/// Minimum allowed watch interval in seconds (prevents busy loops).
const MIN_INTERVAL_SECS: u64 = 10;

/// Read a line from stdin, trimming whitespace.
pub(crate) fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .with_context(|| "Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Read a password from stdin (hidden input).
pub(crate) fn read_secret() -> Result<String> {
    rpassword::read_password_from_bufread(&mut std::io::stdin().lock())
        .with_context(|| "Failed to read secret input")
}

/// Print a prompt without a newline and flush it.
pub(crate) fn prompt(label: &str) -> Result<()> {
    print!("{}", label);
    io::stdout().flush().with_context(|| "Failed to flush stdout")
}

pub(crate) fn load_config() -> Result<Config> {
    Config::load().with_context(|| format!("Failed to load {}", Config::path().display()))
}

pub(crate) fn build_digest(config: &Config) -> Result<CredentialDigest> {
    CredentialDigest::new(config.auth.fixed_key.as_bytes())
        .with_context(|| "Set auth.fixed_key, OPSDECK_AUTH_FIXED_KEY or FIXED_KEY")
}

pub(crate) fn build_verifier(config: &Config) -> Result<CredentialVerifier> {
    Ok(CredentialVerifier::new(
        build_digest(config)?,
        config.auth.reference_path(),
    ))
}

pub(crate) fn build_store(config: &Config) -> Result<Arc<RegistryStore>> {
    let prober = HttpProber::from_config(&config.probe)
        .with_context(|| "Failed to build HTTP prober")?;
    Ok(Arc::new(RegistryStore::from_config(
        &config.registry,
        Arc::new(prober),
    )))
}

pub(crate) fn build_controller(config: &Config) -> Result<ServerController> {
    let store = build_store(config)?;
    let executor = ScriptExecutor::from_config(&config.servers);
    Ok(ServerController::new(store, Arc::new(executor)))
}

/// Print records as an aligned table.
pub(crate) fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("No endpoints registered.");
        return;
    }
    let name_width = records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    println!("{:<width$}  {:<8}  URL", "NAME", "STATUS", width = name_width);
    for r in records {
        println!(
            "{:<width$}  {:<8}  {}",
            r.name,
            r.status.as_str(),
            r.endpoint,
            width = name_width
        );
    }
}

/// Parse interval string like "1h", "30m", "15m", "60s" into seconds.
pub(crate) fn parse_interval(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();
    let secs = if let Some(hours) = s.strip_suffix('h') {
        let n: u64 = hours.parse().with_context(|| "Invalid hours value")?;
        n * 3600
    } else if let Some(mins) = s.strip_suffix('m') {
        let n: u64 = mins.parse().with_context(|| "Invalid minutes value")?;
        n * 60
    } else if let Some(sec_str) = s.strip_suffix('s') {
        sec_str.parse().with_context(|| "Invalid seconds value")?
    } else {
        s.parse::<u64>()
            .with_context(|| "Invalid interval. Use formats like 1h, 30m, or 60s")?
    };

    if secs < MIN_INTERVAL_SECS {
        bail!(
            "Interval too small ({}s). Minimum is {}s to avoid excessive requests.",
            secs,
            MIN_INTERVAL_SECS
        );
    }
    Ok(secs)
}
