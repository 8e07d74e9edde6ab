//! Property-based tests for note handling.
//!
//! Random press/release sequences are played against a synthesizer and
//! checked against a plain model of which keys are down.

use proptest::prelude::*;
use sonant_core::SimBackend;
use sonant_engine::{Mode, Synthesizer};

#[derive(Debug, Clone, Copy)]
enum Key {
    Down(u8),
    Up(u8),
}

fn key() -> impl Strategy<Value = Key> {
    // A narrow range makes repeated presses and releases of the same key likely.
    (any::<bool>(), 36u8..48).prop_map(|(down, note)| if down { Key::Down(note) } else { Key::Up(note) })
}

fn synth(mode: Mode, oscillators: usize) -> Synthesizer<SimBackend> {
    let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
    synth.set_mode(mode).unwrap();
    for _ in 0..oscillators {
        synth.add_oscillator().unwrap();
    }
    synth
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// In poly mode every oscillator has exactly one voice per held key.
    #[test]
    fn poly_voices_match_held_keys(
        keys in proptest::collection::vec(key(), 0..64),
        oscillators in 1usize..4,
    ) {
        let mut synth = synth(Mode::Poly, oscillators);
        let mut held = std::collections::BTreeSet::new();

        for k in keys {
            match k {
                Key::Down(n) => {
                    synth.note_on(n, 100).unwrap();
                    held.insert(n);
                }
                Key::Up(n) => {
                    synth.note_off(n).unwrap();
                    held.remove(&n);
                }
            }
            prop_assert_eq!(synth.active_voice_count(), held.len() * oscillators);
            for osc in synth.oscillators() {
                let notes: Vec<u8> = osc.voices().notes().collect();
                prop_assert_eq!(notes, held.iter().copied().collect::<Vec<_>>());
            }
        }
    }

    /// In mono mode the sounding note is the most recently pressed key that
    /// is still down, and nothing sounds once every key is up.
    #[test]
    fn mono_sounds_last_held_key(keys in proptest::collection::vec(key(), 0..64)) {
        let mut synth = synth(Mode::Mono, 2);
        // Press order, most recent last; a re-press moves the key to the end.
        let mut model: Vec<u8> = Vec::new();

        for k in keys {
            match k {
                Key::Down(n) => {
                    synth.note_on(n, 100).unwrap();
                    model.retain(|&m| m != n);
                    model.push(n);
                }
                Key::Up(n) => {
                    synth.note_off(n).unwrap();
                    model.retain(|&m| m != n);
                }
            }
            prop_assert_eq!(synth.sounding_note(), model.last().copied());
            let expected_voices = if model.is_empty() { 0 } else { 2 };
            prop_assert_eq!(synth.active_voice_count(), expected_voices);
            for osc in synth.oscillators() {
                prop_assert_eq!(osc.mono_voice().map(|v| v.note()), model.last().copied());
            }
        }
    }
}
