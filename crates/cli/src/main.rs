//! agentmesh CLI: the main entry point.
//!
//! Commands:
//! - `orchestrator`: Run the orchestrator service
//! - `agent`:        Serve a card's skills and register with the orchestrator
//! - `chat`:         Send a message and render the event stream
//! - `status`:       Show registered agents

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "agentmesh",
    about = "agentmesh: route questions to registered agents through an LLM",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.agentmesh/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator service
    Orchestrator {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Serve an agent card's skills (echo handlers) and register it
    Agent {
        /// Path to the agent card JSON
        #[arg(long)]
        card: PathBuf,

        /// Port to bind (falls back to the card URL's port)
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Send a chat message to the orchestrator
    Chat {
        message: String,

        /// Orchestrator base URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Show the orchestrator's registered agents
    Status {
        /// Orchestrator base URL
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Orchestrator { port } => commands::orchestrator::run(config, port).await?,
        Commands::Agent { card, port } => commands::agent::run(config, &card, port).await?,
        Commands::Chat { message, url } => commands::chat::run(config, &message, url).await?,
        Commands::Status { url } => commands::status::run(config, url).await?,
    }

    Ok(())
}
