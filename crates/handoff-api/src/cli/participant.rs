//! Participant CLI commands: register, unregister, find, bot-name.

use anyhow::Result;
use console::style;

use handoff_core::routing::SearchCriteria;
use handoff_types::participant::Participant;
use handoff_types::result::CascadeOutcome;

use super::display;
use crate::state::AppState;

/// Register a user or bot instance.
pub async fn register(state: &AppState, participant: Participant, json: bool) -> Result<()> {
    let added = state.registry.register_participant(&participant).await?;

    if json {
        let out = serde_json::json!({
            "added": added,
            "participant": participant,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if added {
        println!(
            "  {} Registered {}",
            style("✓").green().bold(),
            style(&participant).cyan()
        );
    } else {
        println!(
            "  {} {} is already registered",
            style("!").yellow().bold(),
            style(&participant).cyan()
        );
    }
    Ok(())
}

/// Remove a participant and cascade to its requests and connections.
pub async fn unregister(state: &AppState, account_id: &str, json: bool) -> Result<()> {
    let participant = state.resolve_account(account_id).await?;
    let removal = state.registry.remove_participant(&participant).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&removal)?);
        return Ok(());
    }

    if removal.is_not_found() {
        println!(
            "  {} Nothing to remove for {}",
            style("!").yellow().bold(),
            style(&participant).cyan()
        );
        return Ok(());
    }

    println!(
        "  {} Removed {} ({} registry entr{})",
        style("✓").green().bold(),
        style(&participant).cyan(),
        removal.removed,
        if removal.removed == 1 { "y" } else { "ies" }
    );
    for outcome in &removal.outcomes {
        let marker = if outcome.is_error() {
            style("✗").red()
        } else {
            style("·").dim()
        };
        match outcome {
            CascadeOutcome::Request(result) => {
                println!("    {marker} request {}", result.outcome);
                if let Some(message) = &result.error_message {
                    println!("      {}", style(message).red());
                }
            }
            CascadeOutcome::Connection(result) => {
                println!(
                    "    {marker} connection {} <-> {} {}",
                    result.connection.party_a, result.connection.party_b, result.outcome
                );
                if let Some(message) = &result.error_message {
                    println!("      {}", style(message).red());
                }
            }
        }
    }
    Ok(())
}

/// Find one participant matching the criteria.
pub async fn find(state: &AppState, criteria: SearchCriteria, json: bool) -> Result<()> {
    let found = state.registry.find_one(&criteria).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    match found {
        Some(participant) => println!("{}", display::participant_table(&[participant])),
        None => display::print_empty("matching participant"),
    }
    Ok(())
}

/// Print the bot's display name in a conversation.
pub async fn bot_name(
    state: &AppState,
    channel: String,
    conversation: String,
    json: bool,
) -> Result<()> {
    // Only channel and conversation take part in the lookup
    let probe = Participant::endpoint(channel, conversation, String::new());
    let name = state
        .registry
        .resolve_bot_name_in_conversation(&probe)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "name": name }))?);
        return Ok(());
    }

    match name {
        Some(name) => println!("{name}"),
        None => display::print_empty("bot name for this conversation"),
    }
    Ok(())
}
