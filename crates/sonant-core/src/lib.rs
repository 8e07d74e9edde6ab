//! Sonant Core - control-rate primitives for the sonant synthesizer engine
//!
//! This crate holds everything the engine needs beneath the note logic: pitch
//! math, time-scheduled parameter ramps, and the backend interface the engine
//! drives to build its signal graph.
//!
//! # Core Abstractions
//!
//! ## Ramps
//!
//! Click-free parameter changes evaluated against the control clock:
//!
//! - [`Ramp`] - A value moving toward a target over a duration
//! - [`RampShape`] - Linear or exponential curve
//!
//! ## Backend
//!
//! - [`AudioBackend`] - Create, wire, ramp and stop backend primitives
//! - [`NodeId`] - Opaque handle to a backend primitive
//! - [`Waveform`], [`FilterType`], [`ParamKind`] - What the primitives are
//! - [`SimBackend`] - Deterministic in-memory backend with an explicit clock
//!
//! ## Utilities
//!
//! - Pitch math: [`frequency_from_note`], [`semitones_to_ratio`], [`cents_to_ratio`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sonant-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use sonant_core::{AudioBackend, ParamKind, RampShape, SimBackend, Waveform};
//!
//! let mut sim = SimBackend::new();
//! let osc = sim.create_oscillator(Waveform::Sawtooth, 220.0);
//! let amp = sim.create_gain(0.0);
//! sim.connect(osc, amp).unwrap();
//! sim.connect(amp, sim.destination()).unwrap();
//! sim.start(osc).unwrap();
//! sim.ramp(amp, ParamKind::Gain, 0.75, 0.01, RampShape::Linear).unwrap();
//!
//! sim.advance(0.01);
//! assert_eq!(sim.param_value(amp, ParamKind::Gain), Some(0.75));
//! ```
//!
//! # Features
//!
//! - `std` (default): `std::error::Error` impls
//! - `tracing`: trace-level logging of backend graph changes
//! - `serde`: `Serialize` / `Deserialize` for [`Waveform`] and [`FilterType`]

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod backend;
pub mod math;
pub mod ramp;
pub mod sim;

// Re-export main types at crate root
pub use backend::{
    AudioBackend, BackendError, FilterType, NodeId, ParamKind, UnknownName, Waveform,
};
pub use math::{
    A4_FREQUENCY, A4_NOTE, MAX_NOTE, cents_to_ratio, frequency_from_note, semitones_to_ratio,
    transposed_frequency,
};
pub use ramp::{Ramp, RampShape};
pub use sim::{SimBackend, SimNodeKind};
