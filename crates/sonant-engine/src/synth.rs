//! The synthesizer: one engine context per session.
//!
//! [`Synthesizer`] owns the backend, the master gain stage, the ordered
//! oscillator and filter collections, the router and the mono note stack.
//! There is no global instance; callers create one and pass it around (or
//! feed it through a [`CommandBus`](crate::CommandBus)).
//!
//! # Note handling
//!
//! - **Poly**: every oscillator gets its own voice per held note.
//! - **Mono**: every oscillator has one voice. Pressing a key while another
//!   sounds glides to it; releasing the sounding key falls back to the most
//!   recently pressed key that is still held, or goes silent.
//!
//! # Example
//!
//! ```rust
//! use sonant_core::SimBackend;
//! use sonant_engine::{Mode, NodeRef, Synthesizer};
//!
//! let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
//! let osc = synth.add_oscillator().unwrap();
//! let filter = synth.add_filter().unwrap();
//! synth
//!     .set_route(NodeRef::Oscillator(osc), NodeRef::Filter(filter))
//!     .unwrap();
//!
//! synth.set_mode(Mode::Mono).unwrap();
//! synth.note_on(49, 100).unwrap();
//! synth.note_on(53, 100).unwrap();
//! synth.note_off(53).unwrap();
//! assert_eq!(synth.sounding_note(), Some(49));
//! ```

use std::fmt;
use std::str::FromStr;

use sonant_core::{AudioBackend, MAX_NOTE, NodeId, ParamKind, RampShape, Waveform};

use crate::error::{EngineError, Result, finite};
use crate::filter::{Filter, FilterChange, FilterParams};
use crate::note_stack::NoteStack;
use crate::oscillator::{
    Oscillator, OscillatorChange, OscillatorParams, PARAM_SMOOTHING_SECS, time,
};
use crate::router::{NodeRef, Router};

/// Note priority mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Mode {
    /// One voice per held note (default).
    #[default]
    Poly,
    /// One voice per oscillator, last held note wins.
    Mono,
}

impl Mode {
    /// Lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Mode::Poly => "poly",
            Mode::Mono => "mono",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = sonant_core::UnknownName;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "poly" => Ok(Mode::Poly),
            "mono" => Ok(Mode::Mono),
            _ => Err(sonant_core::UnknownName { kind: "mode" }),
        }
    }
}

/// Defaults inherited by new oscillators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Globals {
    /// Envelope rise time in seconds.
    pub attack: f32,
    /// Envelope fall time in seconds.
    pub release: f32,
    /// Mono glide time in seconds.
    pub portamento: f32,
    /// Waveform of new oscillators.
    pub waveform: Waveform,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            attack: 0.01,
            release: 0.01,
            portamento: 0.05,
            waveform: Waveform::Sine,
        }
    }
}

/// Default master gain.
pub const DEFAULT_MASTER_GAIN: f32 = 1.0;

/// The engine context.
#[derive(Debug)]
pub struct Synthesizer<B: AudioBackend> {
    backend: B,
    mode: Mode,
    master_gain: f32,
    master: NodeId,
    globals: Globals,
    oscillators: Vec<Oscillator>,
    filters: Vec<Filter>,
    router: Router,
    notes: NoteStack,
    sounding: Option<u8>,
}

impl<B: AudioBackend> Synthesizer<B> {
    /// Create an empty synthesizer: master gain stage wired to the backend
    /// output, no oscillators, no filters, poly mode.
    pub fn new(mut backend: B) -> Result<Self> {
        let master = backend.create_gain(DEFAULT_MASTER_GAIN);
        let destination = backend.destination();
        backend.connect(master, destination)?;
        tracing::debug!(backend = backend.name(), "synthesizer created");
        Ok(Self {
            backend,
            mode: Mode::default(),
            master_gain: DEFAULT_MASTER_GAIN,
            master,
            globals: Globals::default(),
            oscillators: Vec::new(),
            filters: Vec::new(),
            router: Router::new(master),
            notes: NoteStack::new(),
            sounding: None,
        })
    }

    // -- Topology ---------------------------------------------------------

    /// Add an oscillator inheriting the current globals, wired to master.
    /// Returns its index.
    pub fn add_oscillator(&mut self) -> Result<usize> {
        let index = self.oscillators.len();
        let osc = Oscillator::new(
            &mut self.backend,
            OscillatorParams::from_globals(&self.globals),
        );
        self.router
            .add_oscillator(&mut self.backend, index, osc.output())?;
        self.oscillators.push(osc);
        tracing::debug!(index, "oscillator added");
        Ok(index)
    }

    /// Add a filter with default settings, wired to master. Returns its index.
    pub fn add_filter(&mut self) -> Result<usize> {
        let index = self.filters.len();
        let filter = Filter::new(&mut self.backend, FilterParams::default())?;
        self.router
            .add_filter(&mut self.backend, index, filter.node())?;
        self.filters.push(filter);
        tracing::debug!(index, "filter added");
        Ok(index)
    }

    /// Route a source into a destination. Returns the previous destination.
    pub fn set_route(&mut self, from: NodeRef, to: NodeRef) -> Result<NodeRef> {
        self.router.set_route(&mut self.backend, from, to)
    }

    // -- Notes ------------------------------------------------------------

    /// Switch note priority mode.
    ///
    /// Changing mode releases everything that sounds and forgets held keys,
    /// so no voice is left without a key that can end it. Setting the
    /// current mode again does nothing.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        self.all_notes_off()?;
        self.mode = mode;
        tracing::debug!(%mode, "mode changed");
        Ok(())
    }

    /// Press a key.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<()> {
        check_note(note)?;
        if velocity > MAX_NOTE {
            return Err(EngineError::VelocityOutOfRange(velocity));
        }
        match self.mode {
            Mode::Poly => {
                for osc in &mut self.oscillators {
                    osc.add_voice(&mut self.backend, note, velocity)?;
                }
            }
            Mode::Mono => {
                let sounding = self.sounding.is_some();
                for osc in &mut self.oscillators {
                    if sounding {
                        osc.glide_to(&mut self.backend, note)?;
                    } else {
                        osc.on(&mut self.backend, note, velocity)?;
                    }
                }
                self.notes.press(note);
                self.sounding = Some(note);
            }
        }
        Ok(())
    }

    /// Release a key.
    pub fn note_off(&mut self, note: u8) -> Result<()> {
        check_note(note)?;
        match self.mode {
            Mode::Poly => {
                for osc in &mut self.oscillators {
                    osc.remove_voice(&mut self.backend, note)?;
                }
            }
            Mode::Mono => {
                self.notes.release(note);
                self.resolve_mono()?;
            }
        }
        Ok(())
    }

    /// Release every voice in both modes and forget held keys.
    pub fn all_notes_off(&mut self) -> Result<()> {
        for osc in &mut self.oscillators {
            osc.release_all(&mut self.backend)?;
        }
        self.notes.clear();
        self.sounding = None;
        Ok(())
    }

    fn resolve_mono(&mut self) -> Result<()> {
        match self.notes.resolve() {
            Some(next) if Some(next) == self.sounding => {}
            Some(next) => {
                for osc in &mut self.oscillators {
                    osc.glide_to(&mut self.backend, next)?;
                }
                self.sounding = Some(next);
            }
            None => {
                for osc in &mut self.oscillators {
                    osc.off(&mut self.backend)?;
                }
                self.sounding = None;
            }
        }
        Ok(())
    }

    // -- Globals ----------------------------------------------------------

    /// Ramp the master gain (clamped to 0–1).
    pub fn set_master_gain(&mut self, gain: f32) -> Result<()> {
        let gain = finite("master gain", gain)?.clamp(0.0, 1.0);
        self.backend.ramp(
            self.master,
            ParamKind::Gain,
            gain,
            PARAM_SMOOTHING_SECS,
            RampShape::Linear,
        )?;
        self.master_gain = gain;
        Ok(())
    }

    /// Set the attack time on the globals and every oscillator.
    pub fn set_attack(&mut self, seconds: f32) -> Result<()> {
        let seconds = time("attack", seconds)?;
        self.globals.attack = seconds;
        self.each_oscillator(OscillatorChange::Attack(seconds))
    }

    /// Set the release time on the globals and every oscillator.
    pub fn set_release(&mut self, seconds: f32) -> Result<()> {
        let seconds = time("release", seconds)?;
        self.globals.release = seconds;
        self.each_oscillator(OscillatorChange::Release(seconds))
    }

    /// Set the glide time on the globals and every oscillator.
    pub fn set_portamento(&mut self, seconds: f32) -> Result<()> {
        let seconds = time("portamento", seconds)?;
        self.globals.portamento = seconds;
        self.each_oscillator(OscillatorChange::Portamento(seconds))
    }

    /// Set the waveform new oscillators start with. Existing oscillators
    /// keep theirs.
    pub fn set_default_waveform(&mut self, waveform: Waveform) {
        self.globals.waveform = waveform;
    }

    fn each_oscillator(&mut self, change: OscillatorChange) -> Result<()> {
        for osc in &mut self.oscillators {
            osc.apply(&mut self.backend, change)?;
        }
        Ok(())
    }

    // -- Per-node parameters ----------------------------------------------

    /// Change one parameter of oscillator `index`.
    pub fn set_oscillator(&mut self, index: usize, change: OscillatorChange) -> Result<()> {
        let osc = self
            .oscillators
            .get_mut(index)
            .ok_or(EngineError::UnknownOscillator(index))?;
        osc.apply(&mut self.backend, change)
    }

    /// Change one parameter of filter `index`.
    pub fn set_filter(&mut self, index: usize, change: FilterChange) -> Result<()> {
        let filter = self
            .filters
            .get_mut(index)
            .ok_or(EngineError::UnknownFilter(index))?;
        filter.apply(&mut self.backend, change)
    }

    // -- Accessors --------------------------------------------------------

    /// Current note priority mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Master gain target.
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Master gain node.
    pub fn master_node(&self) -> NodeId {
        self.master
    }

    /// Defaults for new oscillators.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Oscillators in creation order.
    pub fn oscillators(&self) -> &[Oscillator] {
        &self.oscillators
    }

    /// Oscillator `index`.
    pub fn oscillator(&self, index: usize) -> Result<&Oscillator> {
        self.oscillators
            .get(index)
            .ok_or(EngineError::UnknownOscillator(index))
    }

    /// Filters in creation order.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Filter `index`.
    pub fn filter(&self, index: usize) -> Result<&Filter> {
        self.filters
            .get(index)
            .ok_or(EngineError::UnknownFilter(index))
    }

    /// Routing table.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Note sounding in mono mode.
    pub fn sounding_note(&self) -> Option<u8> {
        self.sounding
    }

    /// Mono note stack.
    pub fn note_stack(&self) -> &NoteStack {
        &self.notes
    }

    /// Live voices summed over every oscillator.
    pub fn active_voice_count(&self) -> usize {
        self.oscillators.iter().map(Oscillator::voice_count).sum()
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably (e.g. to advance a simulated clock).
    ///
    /// Graph changes made through this handle bypass the engine's
    /// bookkeeping.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consume the synthesizer, returning its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }
}

fn check_note(note: u8) -> Result<()> {
    if note > MAX_NOTE {
        return Err(EngineError::NoteOutOfRange(note));
    }
    Ok(())
}
