//! CLI command definitions and dispatch for the `handoff` binary.
//!
//! Uses clap derive macros for argument parsing. Participants that already
//! exist somewhere in the registry are addressed by account ID alone and
//! resolved through the widening lookup; new ones take full address flags.

pub mod connection;
pub mod display;
pub mod endpoint;
pub mod participant;
pub mod request;
pub mod status;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use handoff_types::participant::Participant;

/// Route end-users to human operators.
#[derive(Parser)]
#[command(name = "handoff", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every routing collection.
    Status,

    /// Register a user or bot instance.
    Register {
        #[command(flatten)]
        participant: ParticipantArgs,
    },

    /// Remove a participant with its pending requests and connections.
    Unregister {
        /// Account ID of the participant.
        account: String,
    },

    /// Find one participant across registrations, requests, and connections.
    Find {
        #[command(flatten)]
        criteria: CriteriaArgs,
    },

    /// Show the bot's display name in a conversation.
    BotName {
        #[arg(long)]
        channel: String,

        #[arg(long)]
        conversation: String,
    },

    /// Manage aggregation endpoints (operator pools).
    Endpoint {
        #[command(subcommand)]
        action: endpoint::EndpointCommand,
    },

    /// Manage connection requests.
    Request {
        #[command(subcommand)]
        action: request::RequestCommand,
    },

    /// Accept a pending request, connecting the requestor to an operator.
    Accept {
        /// Account ID of the requestor.
        requestor: String,

        /// Account ID of the accepting operator or bot.
        #[arg(long)]
        agent: String,
    },

    /// Record activity on a participant's connection.
    Touch {
        /// Account ID of either party.
        account: String,
    },

    /// End a participant's connection.
    Disconnect {
        /// Account ID of either party.
        account: String,
    },

    /// List connections without recent activity.
    Idle {
        /// Idle threshold in seconds (defaults to `idle_timeout_secs` from config).
        #[arg(long)]
        secs: Option<u64>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Full address of a user or bot instance.
#[derive(Args, Debug, Clone)]
pub struct ParticipantArgs {
    /// Channel ID (e.g. "web", "teams").
    #[arg(long)]
    pub channel: String,

    /// Conversation ID within the channel.
    #[arg(long)]
    pub conversation: String,

    /// Service URL the channel is reached through.
    #[arg(long, default_value = "https://localhost")]
    pub service_url: String,

    /// User account ID.
    #[arg(long, conflicts_with = "bot", required_unless_present = "bot")]
    pub user: Option<String>,

    /// Bot account ID.
    #[arg(long)]
    pub bot: Option<String>,

    /// Display name of the account.
    #[arg(long)]
    pub name: Option<String>,
}

impl ParticipantArgs {
    pub fn into_participant(self) -> Participant {
        let participant = match (self.user, self.bot) {
            (Some(user), _) => {
                Participant::user(self.channel, self.conversation, self.service_url, user)
            }
            (None, Some(bot)) => {
                Participant::bot(self.channel, self.conversation, self.service_url, bot)
            }
            (None, None) => Participant::endpoint(self.channel, self.conversation, self.service_url),
        };

        match self.name {
            Some(name) => participant.named(name),
            None => participant,
        }
    }
}

/// Conversation-only address of an aggregation endpoint.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    #[arg(long)]
    pub channel: String,

    #[arg(long)]
    pub conversation: String,

    #[arg(long, default_value = "https://localhost")]
    pub service_url: String,
}

impl EndpointArgs {
    pub fn into_participant(self) -> Participant {
        Participant::endpoint(self.channel, self.conversation, self.service_url)
    }
}

#[derive(Args, Debug, Clone)]
pub struct CriteriaArgs {
    #[arg(long)]
    pub channel: Option<String>,

    #[arg(long)]
    pub conversation: Option<String>,

    /// Account ID (user or bot).
    #[arg(long)]
    pub account: Option<String>,

    /// Only match bot instances.
    #[arg(long)]
    pub bots_only: bool,
}

impl From<CriteriaArgs> for handoff_core::routing::SearchCriteria {
    fn from(args: CriteriaArgs) -> Self {
        Self {
            channel_id: args.channel,
            conversation_id: args.conversation,
            account_id: args.account,
            bots_only: args.bots_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_participant_args_user() {
        let cli = Cli::try_parse_from([
            "handoff", "register", "--channel", "web", "--conversation", "c1", "--user", "u1",
        ])
        .unwrap();
        let Commands::Register { participant } = cli.command else {
            panic!("expected register");
        };
        let p = participant.into_participant();
        assert_eq!(p.account_id(), Some("u1"));
        assert!(!p.is_bot());
        assert_eq!(p.service_url, "https://localhost");
    }

    #[test]
    fn test_participant_args_bot_with_name() {
        let cli = Cli::try_parse_from([
            "handoff", "register", "--channel", "web", "--conversation", "c1", "--bot", "b1",
            "--name", "Helpdesk",
        ])
        .unwrap();
        let Commands::Register { participant } = cli.command else {
            panic!("expected register");
        };
        let p = participant.into_participant();
        assert!(p.is_bot());
        assert_eq!(p.account_name(), Some("Helpdesk"));
    }

    #[test]
    fn test_participant_args_require_account() {
        let result = Cli::try_parse_from([
            "handoff", "register", "--channel", "web", "--conversation", "c1",
        ]);
        assert!(result.is_err());

        let both = Cli::try_parse_from([
            "handoff", "register", "--channel", "web", "--conversation", "c1", "--user", "u1",
            "--bot", "b1",
        ]);
        assert!(both.is_err());
    }
}
