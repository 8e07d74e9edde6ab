//! Preset management commands.
//!
//! Presets live as `<name>.websynth.json` files in a directory, by default the user
//! configuration directory (see [`DirStore::user`]).

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use clap::{Args, Subcommand};
use sonant_config::{DirStore, PresetStore, Snapshot};

use super::common::{name_from_path, print_snapshot, store};

#[derive(Args)]
pub struct PresetsArgs {
    /// Preset directory (defaults to the user presets directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List stored presets
    List {
        /// Only presets modified within this many seconds
        #[arg(long, value_name = "SECS")]
        since: Option<u64>,
    },

    /// Show details of a preset
    Show {
        /// Preset name
        name: String,
    },

    /// Store a snapshot file as a preset
    Import {
        /// Snapshot file (.json or .toml)
        file: PathBuf,

        /// Preset name (defaults to the snapshot's own name)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite if preset already exists
        #[arg(long)]
        force: bool,
    },

    /// Write a preset to a snapshot file
    Export {
        /// Preset name
        name: String,

        /// Destination file (.json or .toml)
        file: PathBuf,
    },

    /// Show the preset directory
    Path,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    let mut store = store(args.dir);
    match args.command {
        PresetsCommand::List { since } => list_presets(&store, since),
        PresetsCommand::Show { name } => {
            print_snapshot(&store.load(&name)?);
            Ok(())
        }
        PresetsCommand::Import { file, name, force } => {
            import_preset(&mut store, &file, name, force)
        }
        PresetsCommand::Export { name, file } => {
            store.load(&name)?.save(&file)?;
            println!("Exported '{}' to {}", name, file.display());
            Ok(())
        }
        PresetsCommand::Path => {
            println!("{}", store.dir().display());
            Ok(())
        }
    }
}

fn list_presets(store: &DirStore, since: Option<u64>) -> anyhow::Result<()> {
    let names: Vec<String> = match since {
        Some(secs) => {
            let cutoff = SystemTime::now()
                .checked_sub(Duration::from_secs(secs))
                .unwrap_or(SystemTime::UNIX_EPOCH);
            store
                .modified_since(cutoff)?
                .into_iter()
                .map(|s| s.name)
                .collect()
        }
        None => store.names()?,
    };

    if names.is_empty() {
        println!("(no presets in {})", store.dir().display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn import_preset(
    store: &mut DirStore,
    file: &Path,
    name: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let mut snapshot = Snapshot::load(file)?;
    snapshot.validate()?;
    if let Some(name) = name {
        snapshot.name = name;
    } else if snapshot.name.is_empty() {
        snapshot.name = name_from_path(file);
    }

    store.save(&snapshot, force)?;
    tracing::info!(name = %snapshot.name, "preset imported");
    println!("Imported '{}' into {}", snapshot.name, store.dir().display());
    Ok(())
}
