//! Voices and the note-keyed voice map.
//!
//! A [`Voice`] is one sounding instance of an oscillator: a backend tone
//! generator feeding its own envelope gain node, which in turn feeds the
//! owning oscillator's output stage.
//!
//! ```text
//! source ──▶ envelope ──▶ oscillator output ──▶ (router destination)
//! ```
//!
//! Releasing a voice consumes it: the envelope ramps to zero over the release
//! time and both backend nodes are scheduled to stop at the end of that ramp.
//! The engine forgets the voice immediately, so a new press of the same note
//! always gets a fresh voice with a full attack.

use sonant_core::{
    AudioBackend, MAX_NOTE, NodeId, ParamKind, RampShape, transposed_frequency,
};

use crate::error::Result;
use crate::oscillator::OscillatorParams;

const NOTE_COUNT: usize = MAX_NOTE as usize + 1;

/// One sounding note of one oscillator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    note: u8,
    velocity: u8,
    source: NodeId,
    envelope: NodeId,
}

impl Voice {
    /// Create, wire and start a voice, ramping its envelope up to the
    /// oscillator volume over the attack time.
    pub(crate) fn spawn<B: AudioBackend>(
        backend: &mut B,
        params: &OscillatorParams,
        note: u8,
        velocity: u8,
        output: NodeId,
    ) -> Result<Self> {
        let frequency = transposed_frequency(note, params.semitone_offset);
        let source = backend.create_oscillator(params.waveform, frequency);
        backend.ramp(
            source,
            ParamKind::Detune,
            params.fine_detune,
            0.0,
            RampShape::Linear,
        )?;
        let envelope = backend.create_gain(0.0);
        backend.connect(source, envelope)?;
        backend.connect(envelope, output)?;
        backend.start(source)?;
        backend.ramp(
            envelope,
            ParamKind::Gain,
            params.volume,
            f64::from(params.attack),
            RampShape::Linear,
        )?;

        tracing::debug!(note, velocity, frequency, "voice spawned");
        Ok(Self {
            note,
            velocity,
            source,
            envelope,
        })
    }

    /// Fade out over `release` seconds and schedule teardown at the end of
    /// the fade. A zero release cuts off instantly.
    pub(crate) fn release<B: AudioBackend>(self, backend: &mut B, release: f32) -> Result<()> {
        let release = f64::from(release.max(0.0));
        backend.ramp(
            self.envelope,
            ParamKind::Gain,
            0.0,
            release,
            RampShape::Linear,
        )?;
        let end = backend.current_time() + release;
        backend.stop(self.source, end)?;
        backend.stop(self.envelope, end)?;

        tracing::debug!(note = self.note, release, "voice released");
        Ok(())
    }

    /// Move the voice to a new note in place.
    ///
    /// The frequency ramp uses an exponential curve so glides sound even
    /// across the keyboard.
    pub(crate) fn retune<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        note: u8,
        semitone_offset: i32,
        duration: f32,
    ) -> Result<()> {
        backend.ramp(
            self.source,
            ParamKind::Frequency,
            transposed_frequency(note, semitone_offset),
            f64::from(duration),
            RampShape::Exponential,
        )?;
        self.note = note;
        Ok(())
    }

    /// Note this voice is sounding.
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Velocity the voice was struck with.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Backend tone generator.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Backend envelope gain node.
    pub fn envelope(&self) -> NodeId {
        self.envelope
    }
}

/// Note-keyed voice storage over the domain 0–127.
///
/// Inserting a note that already has a voice is refused and removing a note
/// without one returns `None`; neither touches the map.
#[derive(Debug, Clone)]
pub struct VoiceMap {
    slots: [Option<Voice>; NOTE_COUNT],
    len: usize,
}

impl VoiceMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            len: 0,
        }
    }

    /// Voice for `note`, if any.
    pub fn get(&self, note: u8) -> Option<&Voice> {
        self.slots.get(usize::from(note)).and_then(Option::as_ref)
    }

    /// Whether `note` has a voice.
    pub fn contains(&self, note: u8) -> bool {
        self.get(note).is_some()
    }

    /// Store a voice under its note.
    ///
    /// Hands the voice back if the note is out of range or already taken.
    pub fn insert(&mut self, voice: Voice) -> std::result::Result<(), Voice> {
        let Some(slot) = self.slots.get_mut(usize::from(voice.note)) else {
            return Err(voice);
        };
        if slot.is_some() {
            return Err(voice);
        }
        *slot = Some(voice);
        self.len += 1;
        Ok(())
    }

    /// Take the voice for `note` out of the map.
    pub fn remove(&mut self, note: u8) -> Option<Voice> {
        let voice = self.slots.get_mut(usize::from(note))?.take()?;
        self.len -= 1;
        Some(voice)
    }

    /// Take every voice out of the map, in ascending note order.
    pub fn drain(&mut self) -> Vec<Voice> {
        self.len = 0;
        self.slots.iter_mut().filter_map(Option::take).collect()
    }

    /// Live voices in ascending note order.
    pub fn iter(&self) -> impl Iterator<Item = &Voice> {
        self.slots.iter().flatten()
    }

    /// Live voices in ascending note order, mutably.
    ///
    /// Retuning through this iterator must keep each voice on its note.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.slots.iter_mut().flatten()
    }

    /// Notes with a live voice, ascending.
    pub fn notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.iter().map(Voice::note)
    }

    /// Number of live voices.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no voice is live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for VoiceMap {
    fn default() -> Self {
        Self::new()
    }
}
