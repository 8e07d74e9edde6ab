//! Time-scheduled parameter ramps for click-free changes.
//!
//! Every audible parameter (gain, frequency, detune, filter coefficients)
//! moves toward its target over a stated duration instead of jumping. A
//! [`Ramp`] is evaluated against the control clock in seconds, so it can be
//! queried at any instant without being advanced sample by sample.
//!
//! ## Shapes
//!
//! - **Linear**: constant rate of change, reaches the target exactly at
//!   the end of the duration. Used for amplitude envelopes.
//! - **Exponential**: fast start, slow approach. The curve spans five time
//!   constants and is normalized so it lands on the target at the end.
//!   Used for pitch glides.
//!
//! ## Last write wins
//!
//! Scheduling a new ramp while one is in flight starts the new ramp from the
//! value the old one has at that instant. A zero duration is an instant set.
//!
//! ```rust
//! use sonant_core::{Ramp, RampShape};
//!
//! let mut gain = Ramp::new(0.0);
//! gain.ramp_to(1.0, 0.0, 0.1, RampShape::Linear);
//! assert!((gain.value_at(0.05) - 0.5).abs() < 1e-6);
//!
//! // Release halfway through the attack
//! gain.ramp_to(0.0, 0.05, 0.05, RampShape::Linear);
//! assert!((gain.value_at(0.075) - 0.25).abs() < 1e-6);
//! ```

use libm::exp;

/// Time constants covered by an exponential ramp.
const EXP_TIME_CONSTANTS: f64 = 5.0;

/// Curve followed by a [`Ramp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampShape {
    /// Constant rate of change.
    #[default]
    Linear,
    /// One-pole style approach, normalized to end on the target.
    Exponential,
}

/// A parameter value moving toward a target over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    from: f32,
    target: f32,
    start: f64,
    duration: f64,
    shape: RampShape,
}

impl Ramp {
    /// Create a settled ramp holding `initial`.
    pub fn new(initial: f32) -> Self {
        Self {
            from: initial,
            target: initial,
            start: 0.0,
            duration: 0.0,
            shape: RampShape::Linear,
        }
    }

    /// Schedule a move to `target` starting at `now` and lasting `duration`
    /// seconds.
    ///
    /// The ramp starts from its value at `now`, so an in-flight ramp is
    /// superseded rather than restarted. Durations of zero or less (and
    /// non-finite durations) set the value instantly.
    pub fn ramp_to(&mut self, target: f32, now: f64, duration: f64, shape: RampShape) {
        let from = self.value_at(now);
        self.from = from;
        self.target = target;
        self.start = now;
        self.shape = shape;
        self.duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            self.from = target;
            0.0
        };
    }

    /// Jump to `value` with no transition.
    pub fn set_immediate(&mut self, value: f32) {
        self.from = value;
        self.target = value;
        self.duration = 0.0;
    }

    /// Value of the ramp at time `t` (seconds on the control clock).
    pub fn value_at(&self, t: f64) -> f32 {
        if self.duration <= 0.0 || t >= self.start + self.duration {
            return self.target;
        }
        if t <= self.start {
            return self.from;
        }
        let progress = (t - self.start) / self.duration;
        let weight = match self.shape {
            RampShape::Linear => progress,
            RampShape::Exponential => {
                let floor = exp(-EXP_TIME_CONSTANTS);
                1.0 - (exp(-EXP_TIME_CONSTANTS * progress) - floor) / (1.0 - floor)
            }
        };
        let from = f64::from(self.from);
        (from + (f64::from(self.target) - from) * weight) as f32
    }

    /// Value the ramp is heading toward.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Time at which the ramp reaches its target.
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.start + self.duration
    }

    /// Shape of the current segment.
    #[inline]
    pub fn shape(&self) -> RampShape {
        self.shape
    }

    /// Whether the ramp has reached its target by time `t`.
    #[inline]
    pub fn is_settled_at(&self, t: f64) -> bool {
        t >= self.end_time()
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::new(0.0)
    }
}
