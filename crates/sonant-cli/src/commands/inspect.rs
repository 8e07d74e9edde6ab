//! Show the contents of a snapshot file.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use sonant_config::Snapshot;

use super::common::print_snapshot;

/// Output layout for `inspect`.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum Output {
    /// Human-readable summary
    #[default]
    Text,
    /// Normalized JSON
    Json,
    /// Normalized TOML
    Toml,
}

/// Show a snapshot file.
#[derive(Args)]
pub struct InspectArgs {
    /// Snapshot file (.json or .toml)
    pub file: PathBuf,

    /// Output layout
    #[arg(short, long, value_enum, default_value_t = Output::Text)]
    pub output: Output,
}

/// Run the inspect command.
pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let snapshot = Snapshot::load(&args.file)?;

    match args.output {
        Output::Text => {
            println!("File:        {}", args.file.display());
            print_snapshot(&snapshot);
        }
        Output::Json => println!("{}", snapshot.to_json()?),
        Output::Toml => print!("{}", snapshot.to_toml()?),
    }

    Ok(())
}
