//! Endpoint registry command handlers.

use std::time::Duration;

use anyhow::{Context, Result};

use opsdeck::registry::{run_monitor, Mutation};

use super::common::{build_store, load_config, parse_interval, print_records};
use super::SitesAction;

pub(crate) async fn cmd_sites(action: SitesAction) -> Result<()> {
    let config = load_config()?;
    let store = build_store(&config)?;
    let path = store.path().display().to_string();

    match action {
        SitesAction::List { json } => {
            let records = store
                .list()
                .await
                .with_context(|| format!("Failed to open registry {}", path))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                print_records(&records);
            }
        }
        SitesAction::Add { name, url } => {
            let record = store.add(&name, &url).await?;
            println!(
                "Added '{}' ({}) as {}",
                record.name, record.endpoint, record.status
            );
        }
        SitesAction::Edit {
            name,
            url,
            new_name,
            new_url,
        } => {
            let result = store.edit(&name, &url, &new_name, &new_url).await?;
            report(&result, &name, &url, "Updated");
        }
        SitesAction::Delete { name, url } => {
            let result = store.delete(&name, &url).await?;
            report(&result, &name, &url, "Deleted");
        }
        SitesAction::Check { name, url } => {
            let result = store.update_status(&name, &url).await?;
            report(&result, &name, &url, "Checked");
        }
        SitesAction::Repair => {
            let recovered = store
                .repair()
                .await
                .with_context(|| format!("Failed to repair registry {}", path))?;
            println!("Recovered {} record(s) in {}", recovered, path);
        }
        SitesAction::Watch { interval, rounds } => {
            let secs = match interval {
                Some(raw) => parse_interval(&raw)?,
                None => config.probe.interval_secs,
            };
            println!("Watching {} every {}s", path, secs);
            println!("Press Ctrl+C to stop.");
            println!();

            run_monitor(&store, Duration::from_secs(secs), rounds, |records| {
                println!("[{}]", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
                print_records(records);
                println!();
            })
            .await;
        }
    }
    Ok(())
}

/// Print the outcome of a lookup-driven mutation followed by the collection.
fn report(result: &Mutation, name: &str, url: &str, verb: &str) {
    if result.is_applied() {
        println!("{} '{}' ({})", verb, name, url);
    } else {
        println!("No endpoint named '{}' with URL {}", name, url);
    }
    println!();
    print_records(result.records());
}
