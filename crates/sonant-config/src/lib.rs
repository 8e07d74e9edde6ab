//! Snapshot persistence for the sonant synthesizer.
//!
//! This crate turns a running [`Synthesizer`](sonant_engine::Synthesizer)
//! into a serializable [`Snapshot`] and back, validates snapshots before
//! they touch an engine, and stores them by name.
//!
//! # Features
//!
//! - **Snapshots**: capture, validate and restore complete patches
//! - **Formats**: JSON and TOML, chosen by file extension
//! - **Validation**: dangling or ineligible routes and out-of-range values
//!   are reported together, before anything is built
//! - **Preset stores**: in-memory and directory-backed, with
//!   modified-since polling
//!
//! # Example
//!
//! ```rust
//! use sonant_config::Snapshot;
//! use sonant_core::SimBackend;
//! use sonant_engine::{NodeRef, Synthesizer};
//!
//! let mut synth = Synthesizer::new(SimBackend::new()).unwrap();
//! synth.add_oscillator().unwrap();
//! synth.add_filter().unwrap();
//! synth
//!     .set_route(NodeRef::Oscillator(0), NodeRef::Filter(0))
//!     .unwrap();
//!
//! let snapshot = Snapshot::capture("filtered", &synth);
//! let toml = snapshot.to_toml().unwrap();
//!
//! let restored = Snapshot::from_toml(&toml)
//!     .unwrap()
//!     .restore(SimBackend::new())
//!     .unwrap();
//! assert_eq!(
//!     restored.router().destination(NodeRef::Oscillator(0)),
//!     Some(NodeRef::Filter(0))
//! );
//! ```

mod error;
mod snapshot;

/// Named snapshot storage.
pub mod store;

/// Snapshot validation.
pub mod validation;

pub use error::ConfigError;
pub use snapshot::{FilterSnapshot, Format, OscillatorSnapshot, Route, Snapshot};
pub use store::{DirStore, MemoryStore, PRESET_SUFFIX, PresetStore};
pub use validation::{ValidationError, ValidationResult, validate_snapshot};
