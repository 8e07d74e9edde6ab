//! Oscillators: a timbre plus the voices currently sounding it.
//!
//! An [`Oscillator`] owns one output gain node (the point the router wires to
//! master or a filter) and either many voices (poly, one per note) or a
//! single mono voice slot that is retuned in place.
//!
//! Timbre changes (waveform, volume, transposition, detune) apply live to
//! every active voice as short ramps over [`PARAM_SMOOTHING_SECS`]. Timing
//! changes (portamento, attack, release) only affect ramps scheduled after
//! the change.

use sonant_core::{AudioBackend, MAX_NOTE, NodeId, ParamKind, RampShape, Waveform};

use crate::error::{EngineError, Result, finite, in_range};
use crate::synth::Globals;
use crate::voice::{Voice, VoiceMap};

/// Ramp time used when a timbre parameter changes under a sounding voice.
pub const PARAM_SMOOTHING_SECS: f64 = 0.005;

/// Default oscillator volume.
pub const DEFAULT_VOLUME: f32 = 0.75;

/// Longest attack, release or glide time in seconds.
pub const MAX_TIME_SECS: f32 = 60.0;

/// Widest transposition in semitones, either direction.
pub const MAX_SEMITONE_OFFSET: i32 = 48;

/// Widest fine detune in cents, either direction.
pub const MAX_FINE_DETUNE: f32 = 1200.0;

/// Stored settings of an oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorParams {
    /// Waveform of every voice.
    pub waveform: Waveform,
    /// Peak envelope level, 0–1.
    pub volume: f32,
    /// Transposition in semitones.
    pub semitone_offset: i32,
    /// Fine pitch offset in cents.
    pub fine_detune: f32,
    /// Mono glide time in seconds.
    pub portamento: f32,
    /// Envelope rise time in seconds.
    pub attack: f32,
    /// Envelope fall time in seconds.
    pub release: f32,
}

impl OscillatorParams {
    /// Defaults for a new oscillator created under `globals`.
    pub fn from_globals(globals: &Globals) -> Self {
        Self {
            waveform: globals.waveform,
            portamento: globals.portamento,
            attack: globals.attack,
            release: globals.release,
            ..Self::default()
        }
    }
}

impl Default for OscillatorParams {
    fn default() -> Self {
        let globals = Globals::default();
        Self {
            waveform: globals.waveform,
            volume: DEFAULT_VOLUME,
            semitone_offset: 0,
            fine_detune: 0.0,
            portamento: globals.portamento,
            attack: globals.attack,
            release: globals.release,
        }
    }
}

/// A single-parameter change to an oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OscillatorChange {
    /// New waveform.
    Waveform(Waveform),
    /// New volume (clamped to 0–1).
    Volume(f32),
    /// New transposition in semitones, at most [`MAX_SEMITONE_OFFSET`] away
    /// from zero.
    SemitoneOffset(i32),
    /// New fine detune in cents, at most [`MAX_FINE_DETUNE`] away from zero.
    FineDetune(f32),
    /// New glide time in seconds, 0 to [`MAX_TIME_SECS`].
    Portamento(f32),
    /// New attack time in seconds, 0 to [`MAX_TIME_SECS`].
    Attack(f32),
    /// New release time in seconds, 0 to [`MAX_TIME_SECS`].
    Release(f32),
}

/// A tone source with its active voices.
#[derive(Debug)]
pub struct Oscillator {
    params: OscillatorParams,
    voices: VoiceMap,
    mono: Option<Voice>,
    output: NodeId,
}

impl Oscillator {
    /// Create an oscillator and its output stage. The output is left
    /// unconnected; the router wires it.
    pub(crate) fn new<B: AudioBackend>(backend: &mut B, params: OscillatorParams) -> Self {
        Self {
            params,
            voices: VoiceMap::new(),
            mono: None,
            output: backend.create_gain(1.0),
        }
    }

    /// Start a poly voice for `note`. A note that already sounds is left
    /// alone. Returns whether a voice was created.
    pub fn add_voice<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        note: u8,
        velocity: u8,
    ) -> Result<bool> {
        if note > MAX_NOTE {
            return Err(EngineError::NoteOutOfRange(note));
        }
        if self.voices.contains(note) {
            return Ok(false);
        }
        let voice = Voice::spawn(backend, &self.params, note, velocity, self.output)?;
        if let Err(voice) = self.voices.insert(voice) {
            voice.release(backend, 0.0)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Release the poly voice for `note`. Missing notes are a no-op. Returns
    /// whether a voice was released.
    pub fn remove_voice<B: AudioBackend>(&mut self, backend: &mut B, note: u8) -> Result<bool> {
        match self.voices.remove(note) {
            Some(voice) => {
                voice.release(backend, self.params.release)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Turn the mono voice on at `note`. If it is already on, it glides.
    pub fn on<B: AudioBackend>(&mut self, backend: &mut B, note: u8, velocity: u8) -> Result<()> {
        if self.mono.is_some() {
            return self.glide_to(backend, note);
        }
        self.mono = Some(Voice::spawn(
            backend,
            &self.params,
            note,
            velocity,
            self.output,
        )?);
        Ok(())
    }

    /// Glide the mono voice to `note` over the portamento time. No-op when
    /// the mono voice is off.
    pub fn glide_to<B: AudioBackend>(&mut self, backend: &mut B, note: u8) -> Result<()> {
        let (semitones, portamento) = (self.params.semitone_offset, self.params.portamento);
        match self.mono.as_mut() {
            Some(voice) => voice.retune(backend, note, semitones, portamento),
            None => Ok(()),
        }
    }

    /// Release the mono voice. No-op when it is already off.
    pub fn off<B: AudioBackend>(&mut self, backend: &mut B) -> Result<()> {
        match self.mono.take() {
            Some(voice) => voice.release(backend, self.params.release),
            None => Ok(()),
        }
    }

    /// Release every poly voice and the mono voice.
    pub fn release_all<B: AudioBackend>(&mut self, backend: &mut B) -> Result<()> {
        for voice in self.voices.drain() {
            voice.release(backend, self.params.release)?;
        }
        self.off(backend)
    }

    /// Apply one parameter change, live on every active voice where the
    /// parameter is audible.
    pub fn apply<B: AudioBackend>(&mut self, backend: &mut B, change: OscillatorChange) -> Result<()> {
        match change {
            OscillatorChange::Waveform(w) => self.set_waveform(backend, w),
            OscillatorChange::Volume(v) => self.set_volume(backend, v),
            OscillatorChange::SemitoneOffset(s) => self.set_semitone_offset(backend, s),
            OscillatorChange::FineDetune(c) => self.set_fine_detune(backend, c),
            OscillatorChange::Portamento(t) => self.set_portamento(t),
            OscillatorChange::Attack(t) => self.set_attack(t),
            OscillatorChange::Release(t) => self.set_release(t),
        }
    }

    /// Change the waveform of this oscillator and all its voices.
    pub fn set_waveform<B: AudioBackend>(&mut self, backend: &mut B, waveform: Waveform) -> Result<()> {
        self.params.waveform = waveform;
        for voice in self.active_voices() {
            backend.set_waveform(voice.source(), waveform)?;
        }
        Ok(())
    }

    /// Change the peak level, ramping every active envelope to it.
    pub fn set_volume<B: AudioBackend>(&mut self, backend: &mut B, volume: f32) -> Result<()> {
        let volume = finite("volume", volume)?.clamp(0.0, 1.0);
        self.params.volume = volume;
        for voice in self.active_voices() {
            backend.ramp(
                voice.envelope(),
                ParamKind::Gain,
                volume,
                PARAM_SMOOTHING_SECS,
                RampShape::Linear,
            )?;
        }
        Ok(())
    }

    /// Change the transposition, re-deriving every active voice's frequency.
    pub fn set_semitone_offset<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        semitones: i32,
    ) -> Result<()> {
        if !(-MAX_SEMITONE_OFFSET..=MAX_SEMITONE_OFFSET).contains(&semitones) {
            return Err(EngineError::InvalidValue {
                param: "semitone offset",
                value: semitones as f32,
            });
        }
        self.params.semitone_offset = semitones;
        let smoothing = PARAM_SMOOTHING_SECS as f32;
        for voice in self.voices.iter_mut().chain(self.mono.iter_mut()) {
            let note = voice.note();
            voice.retune(backend, note, semitones, smoothing)?;
        }
        Ok(())
    }

    /// Change the fine detune on every active voice.
    pub fn set_fine_detune<B: AudioBackend>(&mut self, backend: &mut B, cents: f32) -> Result<()> {
        let cents = in_range("fine detune", cents, -MAX_FINE_DETUNE, MAX_FINE_DETUNE)?;
        self.params.fine_detune = cents;
        for voice in self.active_voices() {
            backend.ramp(
                voice.source(),
                ParamKind::Detune,
                cents,
                PARAM_SMOOTHING_SECS,
                RampShape::Linear,
            )?;
        }
        Ok(())
    }

    /// Set the glide time used by later mono retunes.
    pub fn set_portamento(&mut self, seconds: f32) -> Result<()> {
        self.params.portamento = time("portamento", seconds)?;
        Ok(())
    }

    /// Set the attack time used by later voices.
    pub fn set_attack(&mut self, seconds: f32) -> Result<()> {
        self.params.attack = time("attack", seconds)?;
        Ok(())
    }

    /// Set the release time used by later releases.
    pub fn set_release(&mut self, seconds: f32) -> Result<()> {
        self.params.release = time("release", seconds)?;
        Ok(())
    }

    /// Current settings.
    pub fn params(&self) -> &OscillatorParams {
        &self.params
    }

    /// Output gain node; the routing point for this oscillator.
    pub fn output(&self) -> NodeId {
        self.output
    }

    /// Poly voices, keyed by note.
    pub fn voices(&self) -> &VoiceMap {
        &self.voices
    }

    /// The mono voice, if on.
    pub fn mono_voice(&self) -> Option<&Voice> {
        self.mono.as_ref()
    }

    /// Live voices in both modes.
    pub fn voice_count(&self) -> usize {
        self.voices.len() + usize::from(self.mono.is_some())
    }

    fn active_voices(&self) -> impl Iterator<Item = &Voice> {
        self.voices.iter().chain(self.mono.iter())
    }
}

/// Check an envelope or glide time.
pub(crate) fn time(param: &'static str, seconds: f32) -> Result<f32> {
    in_range(param, seconds, 0.0, MAX_TIME_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonant_core::{SimBackend, frequency_from_note};

    fn setup() -> (SimBackend, Oscillator) {
        let mut sim = SimBackend::new();
        let osc = Oscillator::new(&mut sim, OscillatorParams::default());
        (sim, osc)
    }

    #[test]
    fn test_defaults() {
        let p = OscillatorParams::default();
        assert_eq!(p.waveform, Waveform::Sine);
        assert_eq!(p.volume, 0.75);
        assert_eq!(p.semitone_offset, 0);
        assert_eq!(p.portamento, 0.05);
        assert_eq!(p.attack, 0.01);
        assert_eq!(p.release, 0.01);
    }

    #[test]
    fn test_inherits_globals() {
        let globals = Globals {
            attack: 0.2,
            release: 0.3,
            portamento: 0.4,
            waveform: Waveform::Triangle,
        };
        let p = OscillatorParams::from_globals(&globals);
        assert_eq!(p.attack, 0.2);
        assert_eq!(p.release, 0.3);
        assert_eq!(p.portamento, 0.4);
        assert_eq!(p.waveform, Waveform::Triangle);
        assert_eq!(p.volume, DEFAULT_VOLUME);
    }

    #[test]
    fn test_add_voice_dedupes() {
        let (mut sim, mut osc) = setup();
        assert!(osc.add_voice(&mut sim, 60, 100).unwrap());
        assert!(!osc.add_voice(&mut sim, 60, 100).unwrap());
        assert_eq!(osc.voice_count(), 1);
        assert_eq!(sim.running_oscillators().len(), 1);
    }

    #[test]
    fn test_remove_voice_twice_same_as_once() {
        let (mut sim, mut osc) = setup();
        osc.add_voice(&mut sim, 60, 100).unwrap();
        assert!(osc.remove_voice(&mut sim, 60).unwrap());
        let after_once = (osc.voice_count(), sim.live_node_count());
        assert!(!osc.remove_voice(&mut sim, 60).unwrap());
        assert_eq!((osc.voice_count(), sim.live_node_count()), after_once);
    }

    #[test]
    fn test_volume_applies_live() {
        let (mut sim, mut osc) = setup();
        osc.add_voice(&mut sim, 60, 100).unwrap();
        osc.set_volume(&mut sim, 0.3).unwrap();

        let env = osc.voices().get(60).unwrap().envelope();
        sim.advance(PARAM_SMOOTHING_SECS);
        let g = sim.param_value(env, ParamKind::Gain).unwrap();
        assert!((g - 0.3).abs() < 1e-5, "expected 0.3, got {}", g);
    }

    #[test]
    fn test_volume_is_clamped() {
        let (mut sim, mut osc) = setup();
        osc.set_volume(&mut sim, 4.0).unwrap();
        assert_eq!(osc.params().volume, 1.0);
        assert!(osc.set_volume(&mut sim, f32::NAN).is_err());
        assert_eq!(osc.params().volume, 1.0, "rejected value leaves state alone");
    }

    #[test]
    fn test_semitone_offset_retunes_voices() {
        let (mut sim, mut osc) = setup();
        osc.add_voice(&mut sim, 49, 100).unwrap();
        osc.set_semitone_offset(&mut sim, -12).unwrap();

        let src = osc.voices().get(49).unwrap().source();
        sim.advance(PARAM_SMOOTHING_SECS);
        let f = sim.param_value(src, ParamKind::Frequency).unwrap();
        assert!((f - 220.0).abs() < 1e-2, "expected 220 Hz, got {}", f);
        assert_eq!(osc.voice_count(), 1);
    }

    #[test]
    fn test_fine_detune_applies_live() {
        let (mut sim, mut osc) = setup();
        osc.on(&mut sim, 49, 100).unwrap();
        osc.set_fine_detune(&mut sim, 50.0).unwrap();

        let src = osc.mono_voice().unwrap().source();
        sim.advance(PARAM_SMOOTHING_SECS);
        assert_eq!(sim.param_value(src, ParamKind::Detune), Some(50.0));
    }

    #[test]
    fn test_waveform_applies_live() {
        let (mut sim, mut osc) = setup();
        osc.add_voice(&mut sim, 60, 100).unwrap();
        osc.set_waveform(&mut sim, Waveform::Sawtooth).unwrap();
        let src = osc.voices().get(60).unwrap().source();
        assert_eq!(
            sim.kind(src),
            Some(sonant_core::SimNodeKind::Oscillator(Waveform::Sawtooth))
        );
    }

    #[test]
    fn test_mono_glide_retunes_in_place() {
        let (mut sim, mut osc) = setup();
        osc.on(&mut sim, 49, 100).unwrap();
        let src = osc.mono_voice().unwrap().source();

        osc.on(&mut sim, 61, 100).unwrap();
        assert_eq!(osc.mono_voice().unwrap().source(), src, "no new voice");
        assert_eq!(osc.mono_voice().unwrap().note(), 61);

        sim.advance(f64::from(osc.params().portamento));
        let f = sim.param_value(src, ParamKind::Frequency).unwrap();
        assert!(
            (f - frequency_from_note(61)).abs() < 1e-2,
            "glide should land on 880 Hz, got {}",
            f
        );
    }

    #[test]
    fn test_mono_off_is_idempotent() {
        let (mut sim, mut osc) = setup();
        osc.on(&mut sim, 49, 100).unwrap();
        osc.off(&mut sim).unwrap();
        osc.off(&mut sim).unwrap();
        assert!(osc.mono_voice().is_none());
        osc.glide_to(&mut sim, 50).unwrap();
        assert!(osc.mono_voice().is_none());
    }

    #[test]
    fn test_release_all_clears_both_modes() {
        let (mut sim, mut osc) = setup();
        osc.add_voice(&mut sim, 40, 100).unwrap();
        osc.add_voice(&mut sim, 44, 100).unwrap();
        osc.on(&mut sim, 47, 100).unwrap();
        assert_eq!(osc.voice_count(), 3);

        osc.release_all(&mut sim).unwrap();
        assert_eq!(osc.voice_count(), 0);
        sim.advance(f64::from(osc.params().release));
        assert!(sim.running_oscillators().is_empty());
    }

    #[test]
    fn test_timing_params_reject_out_of_range() {
        let (_, mut osc) = setup();
        osc.set_release(0.0).unwrap();
        osc.set_portamento(0.25).unwrap();
        osc.set_attack(MAX_TIME_SECS).unwrap();

        assert!(matches!(
            osc.set_attack(-1.0),
            Err(EngineError::InvalidValue { param: "attack", .. })
        ));
        assert!(osc.set_release(MAX_TIME_SECS + 1.0).is_err());
        assert!(osc.set_portamento(f32::NAN).is_err());

        assert_eq!(osc.params().attack, MAX_TIME_SECS);
        assert_eq!(osc.params().release, 0.0);
        assert_eq!(osc.params().portamento, 0.25);
    }

    #[test]
    fn test_pitch_offsets_reject_out_of_range() {
        let (mut sim, mut osc) = setup();
        osc.add_voice(&mut sim, 60, 100).unwrap();
        osc.set_semitone_offset(&mut sim, -MAX_SEMITONE_OFFSET).unwrap();
        assert!(osc.set_semitone_offset(&mut sim, 60).is_err());
        assert_eq!(osc.params().semitone_offset, -MAX_SEMITONE_OFFSET);

        osc.set_fine_detune(&mut sim, MAX_FINE_DETUNE).unwrap();
        assert!(osc.set_fine_detune(&mut sim, -2000.0).is_err());
        assert_eq!(osc.params().fine_detune, MAX_FINE_DETUNE);
    }
}
