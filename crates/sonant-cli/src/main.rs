//! Sonant CLI - Drive the sonant synthesizer engine from scripts and
//! manage its snapshots.

mod commands;
mod script;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sonant")]
#[command(author, version, about = "Sonant synthesizer engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a performance script against a simulated backend
    Play(commands::play::PlayArgs),

    /// Show the contents of a snapshot file
    Inspect(commands::inspect::InspectArgs),

    /// Check a snapshot file without applying it
    Validate(commands::validate::ValidateArgs),

    /// List, import, and export named presets
    Presets(commands::presets::PresetsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Presets(args) => commands::presets::run(args),
    }
}
