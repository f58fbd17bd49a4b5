//! Server start/stop command handlers.

use anyhow::Result;

use opsdeck::servers::ActionOutcome;

use super::common::{build_controller, load_config};
use super::ServerAction;

/// Run a start/stop action and print its outcome; exits 1 on failure.
pub(crate) async fn cmd_server(action: ServerAction) -> Result<()> {
    let config = load_config()?;
    let controller = build_controller(&config)?;

    let (outcome, json) = match action {
        ServerAction::Start { id, json } => (controller.start(&id).await, json),
        ServerAction::Stop { id, json } => (controller.stop(&id).await, json),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

fn print_outcome(outcome: &ActionOutcome) {
    if let Some(message) = &outcome.message {
        println!("{}", message);
    }
    if let Some(output) = outcome.output.as_deref().filter(|o| !o.is_empty()) {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }
    if let Some(error) = &outcome.error {
        eprintln!("{}", error);
    }
}
