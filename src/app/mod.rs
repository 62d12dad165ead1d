pub mod chat;
mod command;
mod repl;

use crate::config::Config;
use crate::services::content::ContentKind;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

/// ECM Digital back office: agency records and the admin AI assistant
#[derive(Debug, Parser)]
#[command(name = "ecm-desk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Agency CRM and AI assistant for the ECM Digital back office")]
#[command(long_about = r#"
Agency CRM and AI assistant for the ECM Digital back office.

Examples:
  ecm-desk chat                              # Talk to the assistant
  ecm-desk ask "Dodaj kampanię Test za 5000" # One message, then exit
  ecm-desk ask --audio notatka.wav           # Voice message
  ecm-desk context set tone_of_voice "Na ty, konkretnie"
  ecm-desk tasks move <id> in_progress
"#)]
pub struct Cli {
    /// Directory for the document store (overrides storage.data_dir)
    #[arg(long, env = "ECM_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Gemini model (overrides gemini.model)
    #[arg(long, env = "ECM_GEMINI_MODEL", global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive chat with the assistant
    Chat {
        /// Continue a logged session
        #[arg(long)]
        resume: Option<String>,
    },

    /// Send a single message (or voice recording) to the assistant
    Ask {
        /// Message text
        message: Option<String>,

        /// Audio file sent instead of text (wav, mp3, ogg, webm, flac, aac, m4a)
        #[arg(long)]
        audio: Option<PathBuf>,
    },

    /// Agency summary across clients, offers, campaigns and tasks
    Stats,

    /// Insert the default services and case studies
    Seed,

    /// Company knowledge injected into every prompt
    Context {
        #[command(subcommand)]
        action: ContextCommand,
    },

    /// Summarise a meeting transcript into the meeting notes
    Meeting {
        /// Transcript text file
        file: PathBuf,
    },

    /// Draft marketing copy in the agency's tone of voice
    Generate {
        #[arg(value_enum)]
        kind: ContentKind,

        /// What the text is about
        topic: String,
    },

    /// Manage clients
    Clients {
        #[command(subcommand)]
        action: ClientsCommand,
    },

    /// Manage offers
    Offers {
        #[command(subcommand)]
        action: OffersCommand,
    },

    /// List campaigns
    Campaigns {
        #[command(subcommand)]
        action: CampaignsCommand,
    },

    /// Kanban board
    Tasks {
        #[command(subcommand)]
        action: TasksCommand,
    },

    /// Support tickets
    Tickets {
        #[command(subcommand)]
        action: TicketsCommand,
    },

    /// A client's offers, tickets and unread notifications
    Dashboard {
        client_id: String,
    },

    /// Print a logged chat session
    History {
        session_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ContextCommand {
    /// Print every Context OS field
    Show,

    /// Replace one field (tone_of_voice, sops, business_goals, meeting_notes, custom_instructions)
    Set {
        field: String,
        text: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ClientsCommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum OffersCommand {
    List {
        /// Only offers for this client id
        #[arg(long)]
        client: Option<String>,
    },
    Add {
        client_id: String,
        title: String,
        /// Line item as `name:quantity:unit_price`, repeatable
        #[arg(long = "item")]
        items: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
        /// Last day the offer is valid
        #[arg(long)]
        valid_until: Option<String>,
    },
    /// Move an offer to draft, sent, accepted or rejected
    Status {
        id: String,
        status: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum CampaignsCommand {
    List,
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    List,
    Add {
        title: String,
        #[arg(long)]
        priority: Option<String>,
        /// Due day, e.g. 2026-03-01 or "za 3 dni"
        #[arg(long)]
        due: Option<String>,
    },
    /// Move a task to todo, in_progress, review or done (default: next column)
    Move {
        id: String,
        status: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TicketsCommand {
    List,
    Reply {
        id: String,
        text: String,
        #[arg(long, default_value = "ECM Digital")]
        author: String,
    },
    Close {
        id: String,
    },
}

impl Cli {
    /// Applies command-line overrides on top of the loaded config
    #[must_use]
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.display().to_string();
        }
        if let Some(model) = &self.model {
            config.gemini.model = model.clone();
        }
        config
    }
}

/// Runs one CLI command to completion
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let config = cli.apply_overrides(config);
    command::execute(cli.command, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_audio() {
        let cli = Cli::parse_from(["ecm-desk", "ask", "--audio", "notatka.wav"]);
        match cli.command {
            Commands::Ask { message, audio } => {
                assert!(message.is_none());
                assert_eq!(audio, Some(PathBuf::from("notatka.wav")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_generate_kind() {
        let cli = Cli::parse_from(["ecm-desk", "generate", "social-post", "Nowy sklep"]);
        match cli.command {
            Commands::Generate { kind, topic } => {
                assert_eq!(kind, ContentKind::SocialPost);
                assert_eq!(topic, "Nowy sklep");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from(["ecm-desk", "--data-dir", "/tmp/ecm", "--model", "gemini-x", "stats"]);
        let config = cli.apply_overrides(Config::default());
        assert_eq!(config.storage.data_dir, "/tmp/ecm");
        assert_eq!(config.gemini.model, "gemini-x");
    }
}
