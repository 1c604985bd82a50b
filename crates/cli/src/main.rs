//! WOPR CLI: the main entry point.
//!
//! Commands:
//! - `init` - Create the config file and data directory
//! - `chat` - Interactive chat or single-message mode
//! - `analyze` - Describe a screenshot in character
//! - `knowledge` - Inspect and edit what the companion remembers
//! - `providers` - List providers and models, optionally test the connection

use clap::{Parser, Subcommand};

mod commands;
mod session;

#[derive(Parser)]
#[command(
    name = "wopr",
    about = "WOPR — a desktop companion that talks back",
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
    /// Create the default configuration and data directory
    Init,

    /// Chat with the companion
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Wait for the full reply instead of streaming it
        #[arg(long)]
        no_stream: bool,

        /// Ask for web-search augmentation (supported models only)
        #[arg(long)]
        search: bool,
    },

    /// Analyze a JPEG screenshot
    Analyze {
        /// Path to the image
        image: std::path::PathBuf,

        /// What the user has been doing recently, for context
        #[arg(short, long)]
        context: Option<String>,
    },

    /// Manage persistent knowledge
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeAction,
    },

    /// List supported providers and models
    Providers {
        /// Send a test message with the configured provider
        #[arg(long)]
        test: bool,
    },
}

#[derive(Subcommand)]
enum KnowledgeAction {
    /// Show everything remembered
    List,
    /// Remember a fact
    Add { fact: String },
    /// Forget every entry containing a keyword
    Forget { keyword: String },
    /// Forget everything
    Clear {
        #[arg(long)]
        confirm: bool,
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
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Chat {
            message,
            no_stream,
            search,
        } => commands::chat::run(message, !no_stream, search).await?,
        Commands::Analyze { image, context } => commands::analyze::run(&image, context).await?,
        Commands::Knowledge { action } => match action {
            KnowledgeAction::List => commands::knowledge::list().await?,
            KnowledgeAction::Add { fact } => commands::knowledge::add(&fact).await?,
            KnowledgeAction::Forget { keyword } => commands::knowledge::forget(&keyword).await?,
            KnowledgeAction::Clear { confirm } => commands::knowledge::clear(confirm).await?,
        },
        Commands::Providers { test } => commands::providers::run(test).await?,
    }

    Ok(())
}
