//! GroupTrack CLI - Command-line interface for GroupTrack
//!
//! Provides commands for:
//! - Inspecting the persisted membership indexes
//! - Checking snapshot files before publishing them
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{check::CheckCommand, config::ConfigCommand, status::StatusCommand};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "grouptrack", version, about = "Group membership tracker")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show tracked groups, or the members of one group
    Status(StatusCommand),
    /// Parse a snapshot file and report what the tracker would see
    Check(CheckCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = OutputFormat::from_json_flag(cli.json);
    let config_path = commands::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Status(cmd) => cmd.execute(format, &config_path).await,
        Commands::Check(cmd) => cmd.execute(format).await,
        Commands::Config(cmd) => cmd.execute(format, &config_path).await,
    }
}
