use crate::commands::{count, data, links, revid};
use crate::commands::{init, open_store};
use crate::concerts::ConcertStore;
use crate::config::Config;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "concertdb")]
#[command(about = "Manage concert links, the concert count and the revision id in a realtime database")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    #[arg(long, help = "Use a throwaway in-process database instead of the remote one")]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Write a default configuration file
    Init(InitArgs),

    /// Print the raw value stored at a path
    Get(GetArgs),

    /// Print the concert count
    Count,

    /// Overwrite the concert count
    SetCount(SetCountArgs),

    /// Atomically increment the concert count
    Incr,

    /// Print the revision id
    Revid,

    /// Overwrite the revision id
    SetRevid(SetRevidArgs),

    /// Append one concert link
    AddLink(AddLinkArgs),

    /// Append several concert links at once
    SetLinks(SetLinksArgs),

    /// List stored concert links
    Links,

    /// Print a random concert link
    Random,
}

#[derive(Args, Debug, PartialEq)]
pub struct InitArgs {
    #[arg(short, long, help = "Overwrite an existing configuration file")]
    pub force: bool,
}

#[derive(Args, Debug, PartialEq)]
pub struct GetArgs {
    /// Slash-separated path, e.g. concerts/links
    #[arg(default_value = "concerts")]
    pub path: String,
}

#[derive(Args, Debug, PartialEq)]
pub struct SetCountArgs {
    #[arg(allow_negative_numbers = true)]
    pub count: i64,
}

#[derive(Args, Debug, PartialEq)]
pub struct SetRevidArgs {
    #[arg(allow_negative_numbers = true)]
    pub id: i64,
}

#[derive(Args, Debug, PartialEq)]
pub struct AddLinkArgs {
    pub link: String,
}

#[derive(Args, Debug, PartialEq)]
pub struct SetLinksArgs {
    #[arg(required = true, num_args = 1..)]
    pub links: Vec<String>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = self.config.unwrap_or_else(Config::config_file_path);

        match self.command {
            // Only file defaults are written, never env overrides
            Commands::Init(args) => init::handle_init_command(&config_path, &args),
            command => {
                let config = Config::load_custom(&config_path)?;
                let store = open_store(&config, self.memory)?;
                command.run(&store).await
            }
        }
    }
}

impl Commands {
    async fn run(self, store: &ConcertStore) -> Result<()> {
        match self {
            // Handled in Cli::run without opening a database
            Commands::Init(_) => Ok(()),
            Commands::Get(args) => data::handle_get_command(store, &args).await,
            Commands::Count => count::handle_count_command(store).await,
            Commands::SetCount(args) => count::handle_set_count_command(store, &args).await,
            Commands::Incr => count::handle_incr_command(store).await,
            Commands::Revid => revid::handle_revid_command(store).await,
            Commands::SetRevid(args) => revid::handle_set_revid_command(store, &args).await,
            Commands::AddLink(args) => links::handle_add_link_command(store, &args).await,
            Commands::SetLinks(args) => links::handle_set_links_command(store, &args).await,
            Commands::Links => links::handle_links_command(store).await,
            Commands::Random => links::handle_random_command(store).await,
        }
    }
}
