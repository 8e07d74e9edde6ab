//! Run a performance script against the simulated backend.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use sonant_config::Snapshot;
use sonant_core::{AudioBackend, SimBackend};
use sonant_engine::{CommandBus, Mode, Notice, Synthesizer};

use super::common::{name_from_path, print_engine};
use crate::script::{self, Step};

/// Run a performance script.
#[derive(Args)]
pub struct PlayArgs {
    /// Script file (one command per line)
    pub script: PathBuf,

    /// Start from this snapshot instead of an empty engine
    #[arg(long, value_name = "SNAPSHOT")]
    pub from: Option<PathBuf>,

    /// Note priority mode to start in (poly, mono)
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Save the final patch to this .json or .toml file
    #[arg(short, long, value_name = "PATH")]
    pub save: Option<PathBuf>,

    /// Name stored in the saved snapshot (defaults to the script's file name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Stop at the first rejected command
    #[arg(long)]
    pub strict: bool,
}

/// Run the play command.
pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script '{}'", args.script.display()))?;
    let steps = script::parse(&source)?;

    let mut synth = match &args.from {
        Some(path) => Snapshot::load(path)?.restore(SimBackend::new())?,
        None => Synthesizer::new(SimBackend::new())?,
    };
    if let Some(mode) = args.mode {
        synth.set_mode(mode)?;
    }

    tracing::info!(script = %args.script.display(), steps = steps.len(), "playing");

    let bus = CommandBus::new();
    let notices = bus.notices();
    let mut rejected = 0usize;

    for step in steps {
        match step {
            Step::Command(command) => {
                bus.send(command);
                bus.pump(&mut synth, usize::MAX);
            }
            Step::Wait(secs) => synth.backend_mut().advance(secs),
        }
        while let Ok(Notice::Rejected { command, reason }) = notices.try_recv() {
            rejected += 1;
            if args.strict {
                anyhow::bail!("command {command:?} rejected: {reason}");
            }
        }
    }

    print_engine(&synth);
    println!(
        "Elapsed:       {:.3}s ({} tone sources running)",
        synth.backend().current_time(),
        synth.backend().running_oscillators().len()
    );
    if rejected > 0 {
        println!("Rejected:      {rejected}");
    }

    if let Some(path) = &args.save {
        let name = args
            .name
            .clone()
            .unwrap_or_else(|| name_from_path(&args.script));
        Snapshot::capture(name, &synth).save(path)?;
        tracing::info!(path = %path.display(), "snapshot saved");
        println!("Saved:         {}", path.display());
    }

    Ok(())
}
