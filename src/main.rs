mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cocoon::config::CocoonConfig;
use cocoon::server;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cocoon", version, about = "Per-user note vault with semantic search")]
struct Cli {
    /// Config file (defaults to ~/.cocoon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API
    Serve,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Rebuild the index from the vaults (one user, or all with --all)
    Reindex {
        #[arg(long, required_unless_present = "all", conflicts_with = "all")]
        user: Option<String>,
        /// Rebuild every user and record the configured embedding model
        #[arg(long)]
        all: bool,
    },
    /// Search a user's notes
    Search {
        #[arg(long)]
        user: String,
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Ask a question over a user's notes
    Ask {
        #[arg(long)]
        user: String,
        question: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Check database health and configuration
    Doctor,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.cocoon/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CocoonConfig::load_from(path)?,
        None => CocoonConfig::load()?,
    };

    // stdout is reserved for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
        Command::Reindex { user, .. } => {
            let service = server::build_service(config)?;
            match user {
                Some(user) => cli::reindex::reindex(&service, &user).await?,
                None => cli::reindex::reindex_all(&service).await?,
            }
        }
        Command::Search { user, query, top_k } => {
            let service = server::build_service(config)?;
            cli::search::search(&service, &user, &query, top_k).await?;
        }
        Command::Ask {
            user,
            question,
            top_k,
        } => {
            let service = server::build_service(config)?;
            cli::search::ask(&service, &user, &question, top_k).await?;
        }
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
