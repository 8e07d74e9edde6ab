//! Error types for engine commands.
//!
//! Every rejected command leaves the engine exactly as it was. Operations
//! that are idempotent by contract (releasing a note that is not sounding,
//! pressing a note that already has a voice) succeed silently and never
//! produce one of these errors.

use sonant_core::BackendError;
use thiserror::Error;

use crate::router::NodeRef;

/// Reasons the engine rejects a command.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// No oscillator exists at this index.
    #[error("no oscillator at index {0}")]
    UnknownOscillator(usize),

    /// No filter exists at this index.
    #[error("no filter at index {0}")]
    UnknownFilter(usize),

    /// The destination is not in the source's eligible set.
    #[error("ineligible route: {from} -> {to}")]
    IneligibleRoute {
        /// Node whose output was being rerouted.
        from: NodeRef,
        /// Requested destination.
        to: NodeRef,
    },

    /// The node cannot be the source of a route.
    #[error("{0} cannot be routed")]
    InvalidSource(NodeRef),

    /// Note number above 127.
    #[error("note {0} out of range 0-127")]
    NoteOutOfRange(u8),

    /// Velocity above 127.
    #[error("velocity {0} out of range 0-127")]
    VelocityOutOfRange(u8),

    /// A parameter value that is NaN, infinite or outside its accepted range.
    #[error("invalid value {value} for {param}")]
    InvalidValue {
        /// Parameter name.
        param: &'static str,
        /// Rejected value.
        value: f32,
    },

    /// The audio backend refused an operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject NaN and infinities, passing finite values through.
pub(crate) fn finite(param: &'static str, value: f32) -> Result<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::InvalidValue { param, value })
    }
}

/// Reject anything outside `min..=max`, NaN included.
pub(crate) fn in_range(param: &'static str, value: f32, min: f32, max: f32) -> Result<f32> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(EngineError::InvalidValue { param, value })
    }
}
