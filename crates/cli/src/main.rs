//! chatwindow CLI — the main entry point.
//!
//! Commands:
//! - `assemble` — Fit a transcript into the configured token budget
//! - `count`    — Count tokens with the configured encoder
//! - `config`   — Show or validate configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chatwindow",
    about = "chatwindow — token-budgeted conversation memory for LLM chats",
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
    /// Assemble a transcript file into the message list that would be sent
    Assemble {
        /// Path to a transcript JSON file
        transcript: std::path::PathBuf,

        /// Override the maximum number of history messages (0 = unlimited)
        #[arg(short, long)]
        max_messages: Option<usize>,

        /// Print messages and metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count the tokens of a piece of text
    Count {
        /// Text to count
        text: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the configuration and report warnings
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Assemble {
            transcript,
            max_messages,
            json,
        } => commands::assemble::run(&transcript, max_messages, json).await?,
        Commands::Count { text } => commands::count::run(&text).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
