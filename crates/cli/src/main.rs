//! GraphChat CLI — the main entry point.
//!
//! Commands:
//! - `ask`      — Send one message and print the result
//! - `chat`     — Interactive conversation mode
//! - `chats`    — List saved conversations
//! - `gateway`  — Start the HTTP API server

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "graphchat",
    about = "GraphChat — conversational subgraph analytics",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message and print the reply
    Ask {
        /// The message text
        text: String,
    },

    /// Enter interactive conversation mode
    Chat,

    /// List saved conversations
    Chats,

    /// Start the HTTP gateway server
    Gateway {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Ask { text } => commands::ask::run(text).await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Chats => commands::chats::run().await?,
        Commands::Gateway { port } => commands::gateway::run(port).await?,
    }

    Ok(())
}
