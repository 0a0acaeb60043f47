//! Handoff CLI entry point.
//!
//! Binary name: `handoff`
//!
//! Parses CLI arguments, opens the routing database, then dispatches to the
//! appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,handoff=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "handoff", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let json = cli.json;

    match cli.command {
        Commands::Status => cli::status::show_status(&state, json).await?,

        Commands::Register { participant } => {
            cli::participant::register(&state, participant.into_participant(), json).await?;
        }

        Commands::Unregister { account } => {
            cli::participant::unregister(&state, &account, json).await?;
        }

        Commands::Find { criteria } => {
            cli::participant::find(&state, criteria.into(), json).await?;
        }

        Commands::BotName {
            channel,
            conversation,
        } => {
            cli::participant::bot_name(&state, channel, conversation, json).await?;
        }

        Commands::Endpoint { action } => {
            cli::endpoint::handle_endpoint_command(action, &state, json).await?;
        }

        Commands::Request { action } => {
            cli::request::handle_request_command(action, &state, json).await?;
        }

        Commands::Accept { requestor, agent } => {
            cli::connection::accept(&state, &requestor, &agent, json).await?;
        }

        Commands::Touch { account } => {
            cli::connection::touch(&state, &account, json).await?;
        }

        Commands::Disconnect { account } => {
            cli::connection::disconnect(&state, &account, json).await?;
        }

        Commands::Idle { secs } => {
            cli::connection::idle(&state, secs, json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
