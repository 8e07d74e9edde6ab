//! Shared CLI helpers used across multiple commands.

use std::path::{Path, PathBuf};

use sonant_config::{DirStore, Snapshot};
use sonant_core::AudioBackend;
use sonant_engine::{NodeRef, Synthesizer};

/// Preset store for an optional `--dir`, defaulting to the user directory.
pub fn store(dir: Option<PathBuf>) -> DirStore {
    dir.map_or_else(DirStore::user, DirStore::new)
}

/// Snapshot name derived from a file name (`pads/warm.toml` -> `warm`).
pub fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.trim_end_matches(".websynth").to_string())
        .unwrap_or_else(|| "untitled".to_string())
}

/// Print a snapshot in the layout shared by `inspect` and `presets show`.
pub fn print_snapshot(snapshot: &Snapshot) {
    println!("Name:        {}", snapshot.name);
    println!("Mode:        {}", snapshot.mode);
    println!("Master gain: {:.3}", snapshot.master_gain);
    println!(
        "Envelope:    attack {:.3}s, release {:.3}s, portamento {:.3}s",
        snapshot.attack, snapshot.release, snapshot.portamento
    );
    println!("Waveform:    {} (default)", snapshot.default_waveform);

    println!();
    println!("Oscillators ({}):", snapshot.oscillators.len());
    for (i, osc) in snapshot.oscillators.iter().enumerate() {
        println!(
            "  {:8} {:9} vol {:.2}  semi {:+3}  detune {:+7.1}c  -> {}",
            NodeRef::Oscillator(i).to_string(),
            osc.waveform.name(),
            osc.volume,
            osc.semitone_offset,
            osc.fine_detune,
            osc.destination
        );
    }

    println!();
    println!("Filters ({}):", snapshot.filters.len());
    for (i, filter) in snapshot.filters.iter().enumerate() {
        println!(
            "  {:8} {:9} {:8.1} Hz  gain {:+5.1} dB  q {:.2}",
            NodeRef::Filter(i).to_string(),
            filter.filter_type.name(),
            filter.frequency,
            filter.gain,
            filter.q
        );
    }

    if !snapshot.routes.is_empty() {
        println!();
        println!("Routes:");
        for route in &snapshot.routes {
            println!("  {} -> {}", route.source, route.destination);
        }
    }
}

/// Print the live state of a synthesizer after a run.
pub fn print_engine<B: AudioBackend>(synth: &Synthesizer<B>) {
    println!("Mode:          {}", synth.mode());
    println!("Oscillators:   {}", synth.oscillators().len());
    println!("Filters:       {}", synth.filters().len());
    println!("Active voices: {}", synth.active_voice_count());
    if let Some(note) = synth.sounding_note() {
        println!("Sounding note: {note}");
    }
    for (source, destination) in synth.router().routes() {
        println!("  {source} -> {destination}");
    }
}
