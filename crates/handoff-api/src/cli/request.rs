//! Connection request CLI subcommands.

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;

use handoff_types::result::{ConnectionRequestResult, RequestOutcome};

use super::{ParticipantArgs, display};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum RequestCommand {
    /// Ask to be connected to an operator.
    Submit {
        #[command(flatten)]
        requestor: ParticipantArgs,

        /// Reject the request when no aggregation endpoint exists
        /// (overrides `reject_requests_without_endpoint` from config).
        #[arg(long)]
        require_endpoint: bool,
    },

    /// Withdraw a pending request.
    Withdraw {
        /// Account ID of the requestor.
        account: String,
    },

    /// List pending requests, longest waiting first.
    List,
}

pub async fn handle_request_command(
    cmd: RequestCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        RequestCommand::Submit {
            requestor,
            require_endpoint,
        } => submit(state, requestor, require_endpoint, json).await,
        RequestCommand::Withdraw { account } => withdraw(state, &account, json).await,
        RequestCommand::List => list(state, json).await,
    }
}

async fn submit(
    state: &AppState,
    args: ParticipantArgs,
    require_endpoint: bool,
    json: bool,
) -> Result<()> {
    let requestor = args.into_participant();
    let reject = require_endpoint || state.config.reject_requests_without_endpoint;
    let result = state.registry.submit_request(&requestor, reject).await?;
    print_result(&result, json)
}

async fn withdraw(state: &AppState, account_id: &str, json: bool) -> Result<()> {
    let participant = state.resolve_account(account_id).await?;
    let request = state
        .registry
        .find_request(&participant)
        .await?
        .with_context(|| format!("No pending request from '{account_id}'"))?;

    let result = state.registry.withdraw_request(&request).await?;
    print_result(&result, json)
}

async fn list(state: &AppState, json: bool) -> Result<()> {
    let requests = state.registry.pending_requests_by_wait().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&requests)?);
    } else if requests.is_empty() {
        display::print_empty("pending requests");
    } else {
        println!("{}", display::request_table(&requests, state.registry.now()));
    }
    Ok(())
}

fn print_result(result: &ConnectionRequestResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let requestor = &result.request.requestor;
    match result.outcome {
        RequestOutcome::Ok => println!(
            "  {} Request from {} is pending",
            style("✓").green().bold(),
            style(requestor).cyan()
        ),
        RequestOutcome::AlreadyRequested => println!(
            "  {} {} already has a pending request",
            style("!").yellow().bold(),
            style(requestor).cyan()
        ),
        RequestOutcome::NotSetup => println!(
            "  {} No aggregation endpoint is set up; request from {} was not queued",
            style("✗").red().bold(),
            style(requestor).cyan()
        ),
        RequestOutcome::Rejected => println!(
            "  {} Request from {} withdrawn",
            style("✓").green().bold(),
            style(requestor).cyan()
        ),
        RequestOutcome::Error => println!(
            "  {} {}",
            style("✗").red().bold(),
            result.error_message.as_deref().unwrap_or("request failed")
        ),
    }
    Ok(())
}
