//! CLI module - command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod auth;
pub mod common;
pub mod config;
pub mod server;
pub mod sites;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "opsdeck")]
#[command(version)]
#[command(about = "Operator dashboard: login, endpoint registry and server control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check operator credentials against the reference file
    Login,
    /// Manage the credential reference file
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Manage monitored endpoints
    Sites {
        #[command(subcommand)]
        action: SitesAction,
    },
    /// Start or stop a registered server
    Server {
        #[command(subcommand)]
        action: ServerAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum AuthAction {
    /// Write a new reference file from a prompted username and password
    Enroll,
    /// Print the transformed form of a value
    Digest {
        /// Value to transform
        text: String,
    },
}

#[derive(Subcommand)]
pub enum SitesAction {
    /// List every endpoint with its last known status
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Probe and register a new endpoint
    Add {
        /// Display name
        name: String,
        /// Endpoint URL
        url: String,
    },
    /// Rename and re-point an endpoint, then re-probe it
    Edit {
        /// Current name
        name: String,
        /// Current URL
        url: String,
        /// New name
        new_name: String,
        /// New URL
        new_url: String,
    },
    /// Remove every endpoint matching name and URL
    Delete {
        /// Name to remove
        name: String,
        /// URL to remove
        url: String,
    },
    /// Re-probe one endpoint and store its status
    Check {
        /// Name to check
        name: String,
        /// URL to check
        url: String,
    },
    /// Rebuild a corrupted registry file from whatever rows can be recovered
    Repair,
    /// Re-probe every endpoint on an interval until interrupted
    Watch {
        /// Interval like 1h, 30m, 60s (default: probe.interval_secs)
        #[arg(long)]
        interval: Option<String>,
        /// Stop after this many rounds
        #[arg(long)]
        rounds: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum ServerAction {
    /// Run the start script for a registered server
    Start {
        /// Server id (registry name, case-insensitive)
        id: String,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the stop script for a registered server
    Stop {
        /// Server id (registry name, case-insensitive)
        id: String,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Check configuration for errors and warnings
    Check,
}

/// Entry point for the CLI, called from main().
pub async fn run() -> Result<()> {
    // `.env` in the working directory may carry FIXED_KEY, START_PATH and
    // friends; a missing file is fine.
    dotenvy::dotenv().ok();

    // Load config early so we can respect the logging settings; fall back to
    // defaults if the config file is missing or unreadable.
    let logging_cfg = opsdeck::config::Config::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    opsdeck::utils::logging::init_logging(&logging_cfg);

    let cli = Cli::parse();

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Login) => {
            auth::cmd_login().await?;
        }
        Some(Commands::Auth { action }) => {
            auth::cmd_auth(action).await?;
        }
        Some(Commands::Sites { action }) => {
            sites::cmd_sites(action).await?;
        }
        Some(Commands::Server { action }) => {
            server::cmd_server(action).await?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(action).await?;
        }
    }

    Ok(())
}

/// Display version information
fn cmd_version() {
    println!("opsdeck {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Operator dashboard: login, endpoint registry and server control");
}
