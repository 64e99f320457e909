//! PeerConnect CLI
//!
//! Main entry point for the peerconnect command-line tool.
//! Check in with a mood entry and get a real-life success story back.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CheckinCommand, JournalCommand, StoriesCommand};
use peerconnect_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// PeerConnect - peer support through similar success stories
#[derive(Parser, Debug)]
#[command(name = "peerconnect")]
#[command(about = "Peer support through semantically similar success stories", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PEERCONNECT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PEERCONNECT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider used for tone labels (ollama)
    #[arg(short, long, global = true, env = "PEERCONNECT_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "PEERCONNECT_MODEL")]
    model: Option<String>,

    /// Embedding provider (local, ollama, trigram)
    #[arg(long, global = true, env = "PEERCONNECT_EMBED")]
    embed: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record a mood entry and get a similar success story
    Checkin(CheckinCommand),

    /// Search, ingest and inspect the story corpus
    Stories(StoriesCommand),

    /// Show recent check-ins
    Journal(JournalCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, then config.yaml, then environment
    let config = AppConfig::load_from(cli.workspace, cli.config)?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.provider,
        cli.model,
        cli.embed,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::info!("PeerConnect CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);
    tracing::debug!("Embedding provider: {}", config.embedding_provider);

    config.ensure_peer_dir()?;

    let command_name = match &cli.command {
        Commands::Checkin(_) => "checkin",
        Commands::Stories(_) => "stories",
        Commands::Journal(_) => "journal",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Checkin(cmd) => cmd.execute(&config).await,
        Commands::Stories(cmd) => cmd.execute(&config).await,
        Commands::Journal(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) if e.is_fatal() => tracing::error!("Command aborted: {}", e),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
