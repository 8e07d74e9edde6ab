//! Integration tests for sonant-config.
//!
//! These tests verify end-to-end functionality across modules: capturing a
//! live engine, writing it to disk in both formats, and restoring it.

use std::time::{Duration, SystemTime};

use proptest::prelude::*;
use sonant_config::{
    ConfigError, DirStore, FilterSnapshot, OscillatorSnapshot, PresetStore, Route, Snapshot,
    ValidationError,
};
use sonant_core::{FilterType, SimBackend, Waveform};
use sonant_engine::{
    FilterChange, MAX_FILTER_GAIN, MAX_FINE_DETUNE, MAX_Q, MAX_SEMITONE_OFFSET, MAX_TIME_SECS,
    Mode, NodeRef, OscillatorChange, Synthesizer,
};
use tempfile::TempDir;

fn demo_synth() -> Synthesizer<SimBackend> {
    let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
    synth.set_mode(Mode::Mono).unwrap();
    synth.set_master_gain(0.8).unwrap();
    synth.set_portamento(0.12).unwrap();
    for _ in 0..3 {
        synth.add_oscillator().unwrap();
    }
    for _ in 0..2 {
        synth.add_filter().unwrap();
    }
    synth
        .set_oscillator(0, OscillatorChange::Waveform(Waveform::Sawtooth))
        .unwrap();
    synth
        .set_oscillator(1, OscillatorChange::SemitoneOffset(7))
        .unwrap();
    synth
        .set_oscillator(2, OscillatorChange::Volume(0.3))
        .unwrap();
    synth
        .set_filter(1, FilterChange::Type(FilterType::Peaking))
        .unwrap();
    synth.set_filter(1, FilterChange::Gain(4.5)).unwrap();
    synth
        .set_route(NodeRef::Oscillator(0), NodeRef::Filter(1))
        .unwrap();
    synth
        .set_route(NodeRef::Oscillator(2), NodeRef::Filter(0))
        .unwrap();
    synth
}

/// Capture, save, load, restore, capture: the snapshot survives unchanged.
#[test]
fn test_round_trip_through_both_formats() {
    let dir = TempDir::new().unwrap();
    let original = Snapshot::capture("demo", &demo_synth());

    for file in ["demo.json", "nested/demo.toml"] {
        let path = dir.path().join(file);
        original.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, original, "{file}");

        let synth = loaded.restore(SimBackend::new()).unwrap();
        assert_eq!(Snapshot::capture("demo", &synth), original, "{file}");
    }
}

#[test]
fn test_restored_engine_plays() {
    let snapshot = Snapshot::capture("demo", &demo_synth());
    let mut synth = snapshot.restore(SimBackend::new()).unwrap();
    assert_eq!(synth.mode(), Mode::Mono);
    synth.note_on(49, 100).unwrap();
    assert_eq!(synth.active_voice_count(), 3);
    assert_eq!(
        synth.router().destination(NodeRef::Oscillator(2)),
        Some(NodeRef::Filter(0))
    );
}

#[test]
fn test_dangling_reference_rejected() {
    let mut snapshot = Snapshot::new("bad");
    snapshot.oscillators.push(OscillatorSnapshot {
        destination: NodeRef::Filter(0),
        ..OscillatorSnapshot::default()
    });
    snapshot.routes.push(Route {
        source: NodeRef::Oscillator(0),
        destination: NodeRef::Filter(0),
    });

    let err = snapshot.restore(SimBackend::new()).unwrap_err();
    let ConfigError::Validation(ValidationError::Multiple(errors)) = err else {
        panic!("expected collected validation errors, got {err:?}");
    };
    assert_eq!(
        errors,
        vec![
            ValidationError::UnknownFilter(0),
            ValidationError::UnknownFilter(0)
        ]
    );

    snapshot.filters.push(FilterSnapshot::default());
    assert!(snapshot.restore(SimBackend::new()).is_ok());
}

#[test]
fn test_load_errors() {
    let dir = TempDir::new().unwrap();

    let missing = Snapshot::load(dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(missing, ConfigError::ReadFile { .. }));

    let yaml = Snapshot::load(dir.path().join("p.yaml")).unwrap_err();
    assert!(matches!(yaml, ConfigError::UnsupportedFormat(_)));

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "name = \"x\"\nattack = ").unwrap();
    assert!(matches!(
        Snapshot::load(&broken).unwrap_err(),
        ConfigError::TomlParse(_)
    ));
}

#[test]
fn test_dir_store_lifecycle() {
    let dir = TempDir::new().unwrap();
    let mut store = DirStore::new(dir.path().join("presets"));
    assert!(store.names().unwrap().is_empty(), "missing dir holds nothing");

    let before = SystemTime::now() - Duration::from_secs(60);
    let demo = Snapshot::capture("demo", &demo_synth());
    store.save(&demo, false).unwrap();
    store.save(&Snapshot::new("init"), false).unwrap();

    assert_eq!(store.names().unwrap(), vec!["demo".to_string(), "init".to_string()]);
    assert_eq!(store.load("demo").unwrap(), demo);
    assert!(matches!(
        store.save(&demo, false),
        Err(ConfigError::PresetExists(_))
    ));
    store.save(&demo, true).unwrap();

    assert_eq!(store.modified_since(before).unwrap().len(), 2);
    let future = SystemTime::now() + Duration::from_secs(3600);
    assert!(store.modified_since(future).unwrap().is_empty());

    assert!(matches!(
        store.load("nope"),
        Err(ConfigError::PresetNotFound(_))
    ));
}

#[test]
fn test_dir_store_ignores_other_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("stray.json"), "{}").unwrap();
    let mut store = DirStore::new(dir.path());
    store.save(&Snapshot::new("only"), false).unwrap();
    assert_eq!(store.names().unwrap(), vec!["only".to_string()]);
    assert!(dir.path().join("only.websynth.json").is_file());
}

fn waveform() -> impl Strategy<Value = Waveform> {
    prop::sample::select(Waveform::ALL.to_vec())
}

fn filter_type() -> impl Strategy<Value = FilterType> {
    prop::sample::select(FilterType::ALL.to_vec())
}

#[test]
fn test_engine_limits_round_trip() {
    let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
    synth.add_oscillator().unwrap();
    synth.add_filter().unwrap();

    // Values past the limits are refused by the engine itself.
    assert!(
        synth
            .set_oscillator(0, OscillatorChange::SemitoneOffset(60))
            .is_err()
    );
    assert!(synth.set_filter(0, FilterChange::Gain(50.0)).is_err());
    assert!(synth.set_attack(120.0).is_err());

    // Values at the limits are held and survive a restore.
    synth
        .set_oscillator(0, OscillatorChange::SemitoneOffset(MAX_SEMITONE_OFFSET))
        .unwrap();
    synth
        .set_oscillator(0, OscillatorChange::FineDetune(-MAX_FINE_DETUNE))
        .unwrap();
    synth
        .set_filter(0, FilterChange::Gain(MAX_FILTER_GAIN))
        .unwrap();
    synth.set_filter(0, FilterChange::Q(MAX_Q)).unwrap();
    synth.set_attack(MAX_TIME_SECS).unwrap();
    synth.set_release(0.0).unwrap();

    let first = Snapshot::capture("edges", &synth);
    let restored = first.restore(SimBackend::new()).unwrap();
    assert_eq!(Snapshot::capture("edges", &restored), first);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever the engine accepts survives capture and restore. Inputs
    /// deliberately reach past every limit; rejected changes are ignored.
    #[test]
    fn capture_restore_is_stable(
        oscs in prop::collection::vec(
            (waveform(), -0.5f32..1.5, -80i32..=80, -2000.0f32..2000.0),
            0..4,
        ),
        filters in prop::collection::vec(
            (filter_type(), 0.0f32..20_000.0, -80.0f32..80.0, -10.0f32..150.0),
            0..3,
        ),
        times in (-5.0f32..90.0, -5.0f32..90.0, -5.0f32..90.0),
        master_gain in -0.5f32..1.5,
        routed in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
        mono in any::<bool>(),
    ) {
        let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
        synth.set_mode(if mono { Mode::Mono } else { Mode::Poly }).unwrap();
        synth.set_master_gain(master_gain).unwrap();
        let _ = synth.set_attack(times.0);
        let _ = synth.set_release(times.1);
        let _ = synth.set_portamento(times.2);
        for &(filter_type, frequency, gain, q) in &filters {
            let i = synth.add_filter().unwrap();
            synth.set_filter(i, FilterChange::Type(filter_type)).unwrap();
            synth.set_filter(i, FilterChange::Frequency(frequency)).unwrap();
            let _ = synth.set_filter(i, FilterChange::Gain(gain));
            let _ = synth.set_filter(i, FilterChange::Q(q));
        }
        for &(waveform, volume, semis, cents) in &oscs {
            synth.set_default_waveform(waveform);
            let i = synth.add_oscillator().unwrap();
            synth.set_oscillator(i, OscillatorChange::Volume(volume)).unwrap();
            let _ = synth.set_oscillator(i, OscillatorChange::SemitoneOffset(semis));
            let _ = synth.set_oscillator(i, OscillatorChange::FineDetune(cents));
        }
        if !filters.is_empty() {
            for (osc, pick) in routed.iter().enumerate().take(oscs.len()) {
                let filter = pick.index(filters.len());
                synth.set_route(NodeRef::Oscillator(osc), NodeRef::Filter(filter)).unwrap();
            }
        }

        let first = Snapshot::capture("p", &synth);
        let checked = first.validate();
        prop_assert!(checked.is_ok(), "{:?}", checked);
        let json = first.to_json().unwrap();
        let second = Snapshot::capture("p", &Snapshot::from_json(&json).unwrap().restore(SimBackend::new()).unwrap());
        prop_assert_eq!(second, first);
    }
}
