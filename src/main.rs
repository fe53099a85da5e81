use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tally::{cli, config, server};

#[derive(Parser)]
#[command(name = "tally", version, about = "Record-keeping for people, actions and 1:1s")]
struct Cli {
    /// Config file (default: ~/.tally/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Start the MCP server (stdio transport)
    Mcp,
    /// Work with record identifiers
    Id {
        #[command(subcommand)]
        action: IdAction,
    },
    /// Export every record as JSON to stdout
    Export,
    /// Show record counts
    Stats,
}

#[derive(Subcommand)]
enum IdAction {
    /// Mint new identifiers
    New {
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Encode 24 hex digits into the 20-character text form
    Encode { hex: String },
    /// Decode a 20-character identifier
    Decode { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::TallyConfig::load_from(path)?,
        None => config::TallyConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC and exports.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve_http(config).await?,
        Command::Mcp => server::serve_stdio(config).await?,
        Command::Id { action } => match action {
            IdAction::New { count } => cli::id::new_ids(count),
            IdAction::Encode { hex } => cli::id::encode(&hex)?,
            IdAction::Decode { id } => cli::id::decode(&id)?,
        },
        Command::Export => cli::export::export(&config)?,
        Command::Stats => cli::stats::stats(&config)?,
    }

    Ok(())
}
