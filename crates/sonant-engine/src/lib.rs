//! Sonant Engine - interactive synthesizer control layer
//!
//! This crate turns note and parameter commands into operations on an
//! [`AudioBackend`](sonant_core::AudioBackend): it decides which tone
//! sources exist, what they are wired to, and how their parameters move
//! over time. It never renders audio itself.
//!
//! # Core Components
//!
//! ## Synthesizer
//!
//! - [`Synthesizer`] - One engine context: oscillators, filters, router,
//!   master gain, mode and globals
//! - [`Mode`] - Poly (voice per note) or mono (last note held, with glide)
//! - [`Globals`] - Defaults inherited by new oscillators
//!
//! ## Sound sources
//!
//! - [`Oscillator`] / [`OscillatorParams`] / [`OscillatorChange`]
//! - [`Voice`] / [`VoiceMap`] - Per-note backend primitives
//! - [`NoteStack`] - Mono note priority
//!
//! ## Shaping and routing
//!
//! - [`Filter`] / [`FilterParams`] / [`FilterChange`]
//! - [`Router`] / [`NodeRef`] - Destination of every source, with the
//!   eligibility rules (oscillators into filters or master, filters into
//!   master only)
//!
//! ## Commands
//!
//! - [`Command`] - The closed set of engine mutations
//! - [`CommandBus`] - Cross-thread command queue drained by the engine owner
//!
//! # Example
//!
//! ```rust
//! use sonant_core::{SimBackend, Waveform};
//! use sonant_engine::{OscillatorChange, Synthesizer};
//!
//! let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
//! let osc = synth.add_oscillator().unwrap();
//! synth
//!     .set_oscillator(osc, OscillatorChange::Waveform(Waveform::Sawtooth))
//!     .unwrap();
//!
//! synth.note_on(60, 100).unwrap();
//! synth.note_on(64, 100).unwrap();
//! assert_eq!(synth.active_voice_count(), 2);
//!
//! synth.note_off(60).unwrap();
//! assert_eq!(synth.active_voice_count(), 1);
//! ```

pub mod command;
pub mod error;
pub mod filter;
pub mod note_stack;
pub mod oscillator;
pub mod router;
pub mod synth;
pub mod voice;

pub use command::{Command, CommandBus, Dispatched, NOTICE_CAPACITY, Notice};
pub use error::{EngineError, Result};
pub use filter::{
    Filter, FilterChange, FilterParams, MAX_FILTER_GAIN, MAX_FREQUENCY, MAX_Q, MIN_FREQUENCY,
};
pub use note_stack::NoteStack;
pub use oscillator::{
    DEFAULT_VOLUME, MAX_FINE_DETUNE, MAX_SEMITONE_OFFSET, MAX_TIME_SECS, Oscillator,
    OscillatorChange, OscillatorParams, PARAM_SMOOTHING_SECS,
};
pub use router::{NodeRef, ParseNodeRefError, Router};
pub use synth::{DEFAULT_MASTER_GAIN, Globals, Mode, Synthesizer};
pub use voice::{Voice, VoiceMap};
