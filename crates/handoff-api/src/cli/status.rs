//! Routing status dashboard command.

use anyhow::Result;
use console::style;

use super::display;
use crate::state::AppState;

/// Display every routing collection.
///
/// Shows counts first, then tables of registered participants, endpoints,
/// pending requests (longest waiting first), and connections.
pub async fn show_status(state: &AppState, json: bool) -> Result<()> {
    let registry = &state.registry;
    let users = registry.users().await?;
    let bots = registry.bot_instances().await?;
    let endpoints = registry.aggregation_endpoints().await?;
    let requests = registry.pending_requests_by_wait().await?;
    let connections = registry.connections().await?;
    let now = registry.now();

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "bot_instances": bots,
            "aggregation_endpoints": endpoints,
            "pending_requests": requests,
            "connections": connections,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Handoff v{}",
        style("⇄").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("  Data: {}", style(state.data_dir.display()).dim());
    println!();

    println!("  {}", style("── Counts ──").dim());
    println!("  Users:       {}", style(users.len()).bold());
    println!("  Bots:        {}", style(bots.len()).bold());
    println!("  Endpoints:   {}", style(endpoints.len()).bold());
    if requests.is_empty() {
        println!("  Waiting:     {}", style(0).dim());
    } else {
        println!("  Waiting:     {}", style(requests.len()).yellow());
    }
    println!("  Connections: {}", style(connections.len()).green());
    println!();

    let mut participants = users;
    participants.extend(bots);
    if !participants.is_empty() {
        println!("  {}", style("── Participants ──").dim());
        println!("{}", display::participant_table(&participants));
    }
    if !endpoints.is_empty() {
        println!("  {}", style("── Aggregation Endpoints ──").dim());
        println!("{}", display::participant_table(&endpoints));
    }
    if !requests.is_empty() {
        println!("  {}", style("── Pending Requests ──").dim());
        println!("{}", display::request_table(&requests, now));
    }
    if !connections.is_empty() {
        println!("  {}", style("── Connections ──").dim());
        println!("{}", display::connection_table(&connections, now));
    }
    Ok(())
}
