//! Aggregation endpoint CLI subcommands.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use super::{EndpointArgs, display};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum EndpointCommand {
    /// Add an operator conversation that receives new requests.
    Add {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Remove an aggregation endpoint.
    Remove {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// Check whether a conversation is an aggregation endpoint.
    Check {
        #[command(flatten)]
        endpoint: EndpointArgs,
    },

    /// List aggregation endpoints.
    List,
}

pub async fn handle_endpoint_command(
    cmd: EndpointCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        EndpointCommand::Add { endpoint } => add(state, endpoint, json).await,
        EndpointCommand::Remove { endpoint } => remove(state, endpoint, json).await,
        EndpointCommand::Check { endpoint } => check(state, endpoint, json).await,
        EndpointCommand::List => list(state, json).await,
    }
}

async fn add(state: &AppState, args: EndpointArgs, json: bool) -> Result<()> {
    let endpoint = args.into_participant();
    let added = state.registry.add_aggregation_endpoint(&endpoint).await?;

    if json {
        let out = serde_json::json!({ "added": added, "endpoint": endpoint });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if added {
        println!("  {} Added {}", style("✓").green().bold(), style(&endpoint).cyan());
    } else {
        println!(
            "  {} {} already exists",
            style("!").yellow().bold(),
            style(&endpoint).cyan()
        );
    }
    Ok(())
}

async fn remove(state: &AppState, args: EndpointArgs, json: bool) -> Result<()> {
    let endpoint = args.into_participant();
    let removed = state.registry.remove_aggregation_endpoint(&endpoint).await?;

    if json {
        let out = serde_json::json!({ "removed": removed, "endpoint": endpoint });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if removed {
        println!("  {} Removed {}", style("✓").green().bold(), style(&endpoint).cyan());
    } else {
        println!(
            "  {} {} not found",
            style("!").yellow().bold(),
            style(&endpoint).cyan()
        );
    }
    Ok(())
}

async fn check(state: &AppState, args: EndpointArgs, json: bool) -> Result<()> {
    let probe = args.into_participant();
    let is_endpoint = state.registry.is_aggregation_endpoint(&probe).await?;

    if json {
        let out = serde_json::json!({ "aggregation_endpoint": is_endpoint });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if is_endpoint {
        println!("  {} {} is an aggregation endpoint", style("✓").green(), probe);
    } else {
        println!("  {} {} is not an aggregation endpoint", style("✗").red(), probe);
    }
    Ok(())
}

async fn list(state: &AppState, json: bool) -> Result<()> {
    let endpoints = state.registry.aggregation_endpoints().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&endpoints)?);
    } else if endpoints.is_empty() {
        display::print_empty("aggregation endpoints");
    } else {
        println!("{}", display::participant_table(&endpoints));
    }
    Ok(())
}
