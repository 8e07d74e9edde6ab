//! Named snapshot storage.
//!
//! A [`PresetStore`] keeps snapshots under their names and can report which
//! ones changed after a point in time, so a client can poll for presets
//! saved elsewhere. Two stores are provided:
//!
//! - [`MemoryStore`] - in-process map, for tests and embedding
//! - [`DirStore`] - one `<name>.websynth.json` file per preset in a directory
//!
//! # Example
//!
//! ```rust
//! use sonant_config::{ConfigError, MemoryStore, PresetStore, Snapshot};
//!
//! let mut store = MemoryStore::new();
//! store.save(&Snapshot::new("pad"), false).unwrap();
//!
//! let again = store.save(&Snapshot::new("pad"), false);
//! assert!(matches!(again, Err(ConfigError::PresetExists(_))));
//!
//! assert_eq!(store.names().unwrap(), vec!["pad".to_string()]);
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::ConfigError;
use crate::snapshot::Snapshot;

/// File suffix used by [`DirStore`].
pub const PRESET_SUFFIX: &str = ".websynth.json";

/// Application name used for the default preset directory.
const APP_NAME: &str = "sonant";

/// Subdirectory name for presets.
const PRESETS_SUBDIR: &str = "presets";

/// Storage for named snapshots.
pub trait PresetStore {
    /// Store `snapshot` under its name. Fails with
    /// [`ConfigError::PresetExists`] if the name is taken and `overwrite` is
    /// false.
    fn save(&mut self, snapshot: &Snapshot, overwrite: bool) -> Result<(), ConfigError>;

    /// Fetch the snapshot stored under `name`.
    fn load(&self, name: &str) -> Result<Snapshot, ConfigError>;

    /// Every stored name, sorted.
    fn names(&self) -> Result<Vec<String>, ConfigError>;

    /// Snapshots saved strictly after `since`, sorted by name.
    fn modified_since(&self, since: SystemTime) -> Result<Vec<Snapshot>, ConfigError>;
}

/// Reject names that cannot be used as a key or a file stem.
fn check_name(name: &str) -> Result<(), ConfigError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory preset store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, (Snapshot, SystemTime)>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with an explicit modification time.
    pub fn save_at(
        &mut self,
        snapshot: &Snapshot,
        overwrite: bool,
        modified: SystemTime,
    ) -> Result<(), ConfigError> {
        check_name(&snapshot.name)?;
        if !overwrite && self.entries.contains_key(&snapshot.name) {
            return Err(ConfigError::PresetExists(snapshot.name.clone()));
        }
        self.entries
            .insert(snapshot.name.clone(), (snapshot.clone(), modified));
        Ok(())
    }

    /// Number of stored presets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PresetStore for MemoryStore {
    fn save(&mut self, snapshot: &Snapshot, overwrite: bool) -> Result<(), ConfigError> {
        self.save_at(snapshot, overwrite, SystemTime::now())
    }

    fn load(&self, name: &str) -> Result<Snapshot, ConfigError> {
        self.entries
            .get(name)
            .map(|(snapshot, _)| snapshot.clone())
            .ok_or_else(|| ConfigError::PresetNotFound(name.to_string()))
    }

    fn names(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn modified_since(&self, since: SystemTime) -> Result<Vec<Snapshot>, ConfigError> {
        Ok(self
            .entries
            .values()
            .filter(|(_, modified)| *modified > since)
            .map(|(snapshot, _)| snapshot.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// DirStore
// ---------------------------------------------------------------------------

/// Directory-backed preset store: `<dir>/<name>.websynth.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in the per-user configuration directory.
    ///
    /// - Linux: `~/.config/sonant/presets/`
    /// - macOS: `~/Library/Application Support/sonant/presets/`
    /// - Windows: `%APPDATA%\sonant\presets\`
    ///
    /// Falls back to `./sonant/presets` if no configuration directory is
    /// known.
    pub fn user() -> Self {
        Self::new(
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
                .join(PRESETS_SUBDIR),
        )
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a preset name maps to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{PRESET_SUFFIX}"))
    }

    /// Preset files in the directory with their stems and modification
    /// times. A missing directory holds no presets.
    fn entries(&self) -> Result<Vec<(String, PathBuf, SystemTime)>, ConfigError> {
        let read = match std::fs::read_dir(&self.dir) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ConfigError::read_file(&self.dir, e)),
        };

        let mut entries = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| ConfigError::read_file(&self.dir, e))?;
            let path = entry.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(PRESET_SUFFIX))
                .map(str::to_string)
            else {
                continue;
            };
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|e| ConfigError::read_file(&path, e))?;
            entries.push((name, path, modified));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

impl PresetStore for DirStore {
    fn save(&mut self, snapshot: &Snapshot, overwrite: bool) -> Result<(), ConfigError> {
        check_name(&snapshot.name)?;
        let path = self.path_for(&snapshot.name);
        if !overwrite && path.exists() {
            return Err(ConfigError::PresetExists(snapshot.name.clone()));
        }
        snapshot.save(&path)?;
        tracing::debug!(name = %snapshot.name, path = %path.display(), "preset saved");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Snapshot, ConfigError> {
        check_name(name)?;
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(ConfigError::PresetNotFound(name.to_string()));
        }
        Snapshot::load(path)
    }

    fn names(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.entries()?.into_iter().map(|(name, _, _)| name).collect())
    }

    fn modified_since(&self, since: SystemTime) -> Result<Vec<Snapshot>, ConfigError> {
        self.entries()?
            .into_iter()
            .filter(|(_, _, modified)| *modified > since)
            .map(|(_, path, _)| Snapshot::load(path))
            .collect()
    }
}
