//! Tether CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `chat`    — Interactive grounded chat
//! - `ask`     — Single-question mode

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "tether",
    about = "Tether — a grounded conversational assistant",
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
    /// Write a default configuration file
    Onboard,

    /// Chat interactively, grounding answers in the document store
    Chat {
        /// Directory of .txt/.md files to load into the in-process index
        #[arg(short, long)]
        corpus: Option<std::path::PathBuf>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question
        question: String,

        /// Directory of .txt/.md files to load into the in-process index
        #[arg(short, long)]
        corpus: Option<std::path::PathBuf>,
    },
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
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Chat { corpus } => commands::chat::run(corpus).await?,
        Commands::Ask { question, corpus } => commands::ask::run(&question, corpus).await?,
    }

    Ok(())
}
