//! Check snapshot files without applying them.

use std::path::PathBuf;

use clap::Args;
use sonant_config::{ConfigError, Snapshot, ValidationError};

/// Validate one or more snapshot files.
#[derive(Args)]
pub struct ValidateArgs {
    /// Snapshot files (.json or .toml)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Run the validate command.
pub fn run(args: ValidateArgs) -> anyhow::Result<()> {
    let mut failed = 0usize;

    for file in &args.files {
        match Snapshot::load(file).and_then(|s| s.validate()) {
            Ok(()) => println!("ok:      {}", file.display()),
            Err(ConfigError::Validation(ValidationError::Multiple(errors))) => {
                failed += 1;
                println!("invalid: {} ({} problems)", file.display(), errors.len());
                for e in errors {
                    println!("  - {e}");
                }
            }
            Err(e) => {
                failed += 1;
                println!("invalid: {}", file.display());
                println!("  - {e}");
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} snapshot(s) invalid", args.files.len());
    }
    Ok(())
}
