//! Filter stages.
//!
//! A [`Filter`] holds a handle to a backend filter primitive plus its own
//! parameter record; the backend node is never exposed for direct mutation.
//! Filters always feed the master output; oscillators are routed into them.

use sonant_core::{AudioBackend, FilterType, NodeId, ParamKind, RampShape};

use crate::error::{Result, finite, in_range};
use crate::oscillator::PARAM_SMOOTHING_SECS;

/// Lowest cutoff frequency in Hz.
pub const MIN_FREQUENCY: f32 = 20.0;

/// Highest cutoff frequency in Hz.
pub const MAX_FREQUENCY: f32 = 10_000.0;

/// Largest resonance.
pub const MAX_Q: f32 = 100.0;

/// Largest shelf / peak gain magnitude in dB.
pub const MAX_FILTER_GAIN: f32 = 40.0;

/// Stored settings of a filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    /// Response type.
    pub filter_type: FilterType,
    /// Cutoff or center frequency in Hz, 20–10000.
    pub frequency: f32,
    /// Shelf / peak gain in dB.
    pub gain: f32,
    /// Resonance.
    pub q: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            filter_type: FilterType::Lowpass,
            frequency: MAX_FREQUENCY,
            gain: 0.0,
            q: 1.0,
        }
    }
}

/// A single-parameter change to a filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterChange {
    /// New response type.
    Type(FilterType),
    /// New cutoff in Hz (clamped to 20–10000).
    Frequency(f32),
    /// New shelf / peak gain in dB, at most [`MAX_FILTER_GAIN`] away from zero.
    Gain(f32),
    /// New resonance, 0 to [`MAX_Q`].
    Q(f32),
}

/// A configurable frequency-shaping stage.
#[derive(Debug)]
pub struct Filter {
    params: FilterParams,
    node: NodeId,
}

impl Filter {
    /// Create the backend primitive and set its parameters without ramping.
    pub(crate) fn new<B: AudioBackend>(backend: &mut B, params: FilterParams) -> Result<Self> {
        let params = FilterParams {
            frequency: params.frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY),
            ..params
        };
        let filter = Self {
            params,
            node: backend.create_filter(params.filter_type),
        };
        filter.ramp(backend, ParamKind::Frequency, params.frequency, 0.0)?;
        filter.ramp(backend, ParamKind::FilterGain, params.gain, 0.0)?;
        filter.ramp(backend, ParamKind::Q, params.q, 0.0)?;
        Ok(filter)
    }

    /// Apply one parameter change.
    pub fn apply<B: AudioBackend>(&mut self, backend: &mut B, change: FilterChange) -> Result<()> {
        match change {
            FilterChange::Type(t) => self.set_type(backend, t),
            FilterChange::Frequency(hz) => self.set_frequency(backend, hz),
            FilterChange::Gain(db) => self.set_gain(backend, db),
            FilterChange::Q(q) => self.set_q(backend, q),
        }
    }

    /// Change the response type.
    pub fn set_type<B: AudioBackend>(&mut self, backend: &mut B, filter_type: FilterType) -> Result<()> {
        backend.set_filter_type(self.node, filter_type)?;
        self.params.filter_type = filter_type;
        Ok(())
    }

    /// Ramp the cutoff, clamped to 20–10000 Hz.
    pub fn set_frequency<B: AudioBackend>(&mut self, backend: &mut B, hz: f32) -> Result<()> {
        let hz = finite("frequency", hz)?.clamp(MIN_FREQUENCY, MAX_FREQUENCY);
        self.ramp(backend, ParamKind::Frequency, hz, PARAM_SMOOTHING_SECS)?;
        self.params.frequency = hz;
        Ok(())
    }

    /// Ramp the shelf / peak gain. Accepted for every type.
    pub fn set_gain<B: AudioBackend>(&mut self, backend: &mut B, db: f32) -> Result<()> {
        let db = in_range("filter gain", db, -MAX_FILTER_GAIN, MAX_FILTER_GAIN)?;
        self.ramp(backend, ParamKind::FilterGain, db, PARAM_SMOOTHING_SECS)?;
        self.params.gain = db;
        Ok(())
    }

    /// Ramp the resonance.
    pub fn set_q<B: AudioBackend>(&mut self, backend: &mut B, q: f32) -> Result<()> {
        let q = in_range("q", q, 0.0, MAX_Q)?;
        self.ramp(backend, ParamKind::Q, q, PARAM_SMOOTHING_SECS)?;
        self.params.q = q;
        Ok(())
    }

    /// Current settings.
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Backend filter node; both the routing destination and the source
    /// feeding master.
    pub fn node(&self) -> NodeId {
        self.node
    }

    fn ramp<B: AudioBackend>(
        &self,
        backend: &mut B,
        param: ParamKind,
        target: f32,
        duration: f64,
    ) -> Result<()> {
        let shape = match param {
            ParamKind::Frequency => RampShape::Exponential,
            _ => RampShape::Linear,
        };
        backend.ramp(self.node, param, target, duration, shape)?;
        Ok(())
    }
}
