//! Snapshot validation.
//!
//! A snapshot is checked as a whole before any of it is applied: every
//! route must name existing nodes and respect the eligibility rules, and
//! every stored value must be finite and inside the range the engine's
//! setters accept, so anything the engine holds can be captured and
//! restored. All problems are collected, so a bad file is
//! reported in one pass.
//!
//! # Example
//!
//! ```rust
//! use sonant_config::{Snapshot, ValidationError, validate_snapshot};
//! use sonant_engine::NodeRef;
//!
//! let mut snapshot = Snapshot::new("broken");
//! snapshot.routes.push(sonant_config::Route {
//!     source: NodeRef::Oscillator(0),
//!     destination: NodeRef::Master,
//! });
//!
//! assert_eq!(
//!     validate_snapshot(&snapshot),
//!     Err(ValidationError::UnknownOscillator(0))
//! );
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use sonant_engine::{MAX_FREQUENCY, MIN_FREQUENCY, NodeRef};
pub use sonant_engine::{
    MAX_FILTER_GAIN, MAX_FINE_DETUNE, MAX_Q, MAX_SEMITONE_OFFSET, MAX_TIME_SECS,
};
use thiserror::Error;

use crate::snapshot::Snapshot;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A route or destination names an oscillator the snapshot lacks.
    #[error("unknown oscillator index: {0}")]
    UnknownOscillator(usize),

    /// A route or destination names a filter the snapshot lacks.
    #[error("unknown filter index: {0}")]
    UnknownFilter(usize),

    /// The destination is not eligible for the source.
    #[error("ineligible route: {from} -> {to}")]
    IneligibleRoute {
        /// Source node.
        from: NodeRef,
        /// Requested destination.
        to: NodeRef,
    },

    /// The routing table lists the same source twice.
    #[error("duplicate route for {0}")]
    DuplicateRoute(NodeRef),

    /// An oscillator's own destination disagrees with the routing table.
    #[error("oscillator {oscillator} declares destination {declared} but is routed to {routed}")]
    DestinationMismatch {
        /// Oscillator index.
        oscillator: usize,
        /// Destination stored on the oscillator.
        declared: NodeRef,
        /// Destination in the routing table.
        routed: NodeRef,
    },

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Parameter path, e.g. `oscillators[1].volume`.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check a snapshot before it is applied.
pub fn validate_snapshot(snapshot: &Snapshot) -> ValidationResult<()> {
    let mut errors = Vec::new();

    check_range(&mut errors, "master_gain", snapshot.master_gain, 0.0, 1.0);
    check_range(&mut errors, "attack", snapshot.attack, 0.0, MAX_TIME_SECS);
    check_range(&mut errors, "release", snapshot.release, 0.0, MAX_TIME_SECS);
    check_range(&mut errors, "portamento", snapshot.portamento, 0.0, MAX_TIME_SECS);

    for (i, osc) in snapshot.oscillators.iter().enumerate() {
        check_range(&mut errors, &format!("oscillators[{i}].volume"), osc.volume, 0.0, 1.0);
        check_range(
            &mut errors,
            &format!("oscillators[{i}].semitone_offset"),
            osc.semitone_offset as f32,
            -MAX_SEMITONE_OFFSET as f32,
            MAX_SEMITONE_OFFSET as f32,
        );
        check_range(
            &mut errors,
            &format!("oscillators[{i}].fine_detune"),
            osc.fine_detune,
            -MAX_FINE_DETUNE,
            MAX_FINE_DETUNE,
        );
        if let Err(e) = check_route(snapshot, NodeRef::Oscillator(i), osc.destination) {
            errors.push(e);
        }
    }

    for (i, filter) in snapshot.filters.iter().enumerate() {
        check_range(
            &mut errors,
            &format!("filters[{i}].frequency"),
            filter.frequency,
            MIN_FREQUENCY,
            MAX_FREQUENCY,
        );
        check_range(
            &mut errors,
            &format!("filters[{i}].gain"),
            filter.gain,
            -MAX_FILTER_GAIN,
            MAX_FILTER_GAIN,
        );
        check_range(&mut errors, &format!("filters[{i}].q"), filter.q, 0.0, MAX_Q);
    }

    let mut seen = BTreeMap::new();
    for route in &snapshot.routes {
        if let Err(e) = check_route(snapshot, route.source, route.destination) {
            errors.push(e);
            continue;
        }
        match seen.entry(route.source) {
            Entry::Vacant(slot) => {
                slot.insert(route.destination);
            }
            Entry::Occupied(_) => errors.push(ValidationError::DuplicateRoute(route.source)),
        }
    }

    for (i, osc) in snapshot.oscillators.iter().enumerate() {
        if let Some(&routed) = seen.get(&NodeRef::Oscillator(i))
            && routed != osc.destination
        {
            errors.push(ValidationError::DestinationMismatch {
                oscillator: i,
                declared: osc.destination,
                routed,
            });
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Same rules the engine's router applies, evaluated against the snapshot.
fn check_route(snapshot: &Snapshot, from: NodeRef, to: NodeRef) -> ValidationResult<()> {
    let exists = |node: NodeRef| match node {
        NodeRef::Oscillator(i) if i >= snapshot.oscillators.len() => {
            Err(ValidationError::UnknownOscillator(i))
        }
        NodeRef::Filter(i) if i >= snapshot.filters.len() => Err(ValidationError::UnknownFilter(i)),
        _ => Ok(()),
    };
    exists(from)?;
    exists(to)?;
    match (from, to) {
        (NodeRef::Oscillator(_), NodeRef::Filter(_) | NodeRef::Master)
        | (NodeRef::Filter(_), NodeRef::Master) => Ok(()),
        _ => Err(ValidationError::IneligibleRoute { from, to }),
    }
}

fn check_range(errors: &mut Vec<ValidationError>, param: &str, value: f32, min: f32, max: f32) {
    if !value.is_finite() || value < min || value > max {
        errors.push(ValidationError::OutOfRange {
            param: param.to_string(),
            value,
            min,
            max,
        });
    }
}
