//! Connection CLI commands: accept, touch, disconnect, idle.

use anyhow::{Context, Result};
use chrono::TimeDelta;
use console::style;

use handoff_infra::config::idle_timeout;
use handoff_types::connection::Connection;
use handoff_types::result::{ConnectionOutcome, ConnectionResult};

use super::display;
use crate::state::AppState;

/// Connect the agent to the requestor's pending request.
pub async fn accept(state: &AppState, requestor_id: &str, agent_id: &str, json: bool) -> Result<()> {
    let requestor = state.resolve_account(requestor_id).await?;
    let request = state
        .registry
        .find_request(&requestor)
        .await?
        .with_context(|| format!("No pending request from '{requestor_id}'"))?;
    let agent = state.resolve_account(agent_id).await?;

    let connection = Connection::new(agent, request.requestor.clone(), state.registry.now());
    let result = state
        .registry
        .accept_request(connection, &request.requestor)
        .await?;
    print_result(&result, json)
}

/// Stamp the participant's connection with the current time.
pub async fn touch(state: &AppState, account_id: &str, json: bool) -> Result<()> {
    let connection = connection_of(state, account_id).await?;
    let refreshed = state
        .registry
        .refresh_activity(&connection)
        .await?
        .with_context(|| format!("Connection of '{account_id}' disappeared"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&refreshed)?);
    } else {
        println!(
            "  {} Activity recorded for {} <-> {}",
            style("✓").green().bold(),
            style(&refreshed.party_a).cyan(),
            style(&refreshed.party_b).cyan()
        );
    }
    Ok(())
}

/// End the participant's connection.
pub async fn disconnect(state: &AppState, account_id: &str, json: bool) -> Result<()> {
    let connection = connection_of(state, account_id).await?;
    let result = state.registry.disconnect(&connection).await?;
    print_result(&result, json)
}

/// List connections idle for longer than `secs` (or the configured timeout).
pub async fn idle(state: &AppState, secs: Option<u64>, json: bool) -> Result<()> {
    let max_idle = match secs {
        Some(secs) => TimeDelta::try_seconds(i64::try_from(secs).unwrap_or(i64::MAX))
            .unwrap_or(TimeDelta::MAX),
        None => idle_timeout(&state.config),
    };
    let connections = state.registry.idle_connections(max_idle).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&connections)?);
    } else if connections.is_empty() {
        display::print_empty("idle connections");
    } else {
        println!(
            "{}",
            display::connection_table(&connections, state.registry.now())
        );
    }
    Ok(())
}

async fn connection_of(state: &AppState, account_id: &str) -> Result<Connection> {
    let participant = state.resolve_account(account_id).await?;
    state
        .registry
        .find_connection(&participant)
        .await?
        .with_context(|| format!("'{account_id}' is not connected"))
}

fn print_result(result: &ConnectionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let pair = format!(
        "{} <-> {}",
        result.connection.party_a, result.connection.party_b
    );
    match result.outcome {
        ConnectionOutcome::Connected => {
            println!("  {} Connected {}", style("✓").green().bold(), style(pair).cyan())
        }
        ConnectionOutcome::Disconnected => println!(
            "  {} Disconnected {}",
            style("✓").green().bold(),
            style(pair).cyan()
        ),
        ConnectionOutcome::Error => println!(
            "  {} {}",
            style("✗").red().bold(),
            result.error_message.as_deref().unwrap_or("connection operation failed")
        ),
    }
    Ok(())
}
