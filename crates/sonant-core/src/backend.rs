//! Audio backend abstraction.
//!
//! The engine never renders samples itself. It creates oscillator, gain and
//! filter primitives on an [`AudioBackend`], wires them together and
//! schedules parameter ramps on them. Everything the engine knows about the
//! signal graph it keeps on its own side; backends are write-only from the
//! engine's point of view.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   Synthesizer (engine state)     │
//! └──────────────┬───────────────────┘
//!                │ create / connect / ramp / stop
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioBackend trait        │
//! └──────────────┬───────────────────┘
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ SimBackend  │  │  platform   │
//! │ (in-memory) │  │  backends   │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! Node handles are plain [`NodeId`]s. A backend may recycle nothing: once a
//! node is stopped its id stays dead.

use core::fmt;
use core::str::FromStr;

use crate::ramp::RampShape;

/// Handle to a primitive owned by an [`AudioBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw backend identifier.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Automatable parameter on a backend primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Linear amplitude of a gain node.
    Gain,
    /// Oscillator pitch or filter cutoff, in Hz.
    Frequency,
    /// Oscillator pitch offset in cents.
    Detune,
    /// Filter resonance.
    Q,
    /// Shelf / peak gain of a filter, in dB.
    FilterGain,
}

impl ParamKind {
    /// Short lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            ParamKind::Gain => "gain",
            ParamKind::Frequency => "frequency",
            ParamKind::Detune => "detune",
            ParamKind::Q => "q",
            ParamKind::FilterGain => "filter-gain",
        }
    }
}

/// Oscillator waveform.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Waveform {
    /// Pure sine.
    #[default]
    Sine,
    /// Square wave.
    Square,
    /// Rising sawtooth.
    Sawtooth,
    /// Triangle wave.
    Triangle,
}

impl Waveform {
    /// All waveforms, in display order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Lowercase name as used in snapshots and scripts.
    pub const fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.name().eq_ignore_ascii_case(s))
            .ok_or(UnknownName { kind: "waveform" })
    }
}

/// Response shape of a filter primitive.
///
/// Gain only affects the shelf and peaking types; other types accept and
/// ignore it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FilterType {
    /// Passes below the cutoff.
    #[default]
    Lowpass,
    /// Passes above the cutoff.
    Highpass,
    /// Passes a band around the cutoff.
    Bandpass,
    /// Flat magnitude, phase shift around the cutoff.
    Allpass,
    /// Boost or cut below the cutoff.
    Lowshelf,
    /// Boost or cut above the cutoff.
    Highshelf,
    /// Boost or cut a band around the cutoff.
    Peaking,
    /// Rejects a band around the cutoff.
    Notch,
}

impl FilterType {
    /// All filter types, in display order.
    pub const ALL: [FilterType; 8] = [
        FilterType::Lowpass,
        FilterType::Highpass,
        FilterType::Bandpass,
        FilterType::Allpass,
        FilterType::Lowshelf,
        FilterType::Highshelf,
        FilterType::Peaking,
        FilterType::Notch,
    ];

    /// Lowercase name as used in snapshots and scripts.
    pub const fn name(&self) -> &'static str {
        match self {
            FilterType::Lowpass => "lowpass",
            FilterType::Highpass => "highpass",
            FilterType::Bandpass => "bandpass",
            FilterType::Allpass => "allpass",
            FilterType::Lowshelf => "lowshelf",
            FilterType::Highshelf => "highshelf",
            FilterType::Peaking => "peaking",
            FilterType::Notch => "notch",
        }
    }

    /// Whether the gain parameter changes this type's response.
    pub const fn uses_gain(&self) -> bool {
        matches!(
            self,
            FilterType::Lowshelf | FilterType::Highshelf | FilterType::Peaking
        )
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterType {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or(UnknownName { kind: "filter type" })
    }
}

/// A name that matches no variant of a named enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownName {
    /// What was being parsed.
    pub kind: &'static str,
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}", self.kind)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownName {}

/// Errors reported by an [`AudioBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The node does not exist or has already been stopped.
    UnknownNode(NodeId),
    /// The node has no parameter of this kind.
    NoSuchParam(NodeId, ParamKind),
    /// The operation needs a different kind of node.
    WrongNodeKind {
        /// Node the operation targeted.
        node: NodeId,
        /// Kind the operation expected.
        expected: &'static str,
    },
    /// Disconnecting an edge that is not present.
    NotConnected(NodeId, NodeId),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "node {id} not found"),
            Self::NoSuchParam(id, param) => {
                write!(f, "node {id} has no {} parameter", param.name())
            }
            Self::WrongNodeKind { node, expected } => {
                write!(f, "node {node} is not a {expected} node")
            }
            Self::NotConnected(a, b) => write!(f, "{a} is not connected to {b}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BackendError {}

/// Graph-building interface onto an audio rendering engine.
///
/// All timing is in seconds on the backend's clock ([`current_time`]).
/// Calls return as soon as the change is scheduled; none of them wait for a
/// ramp to finish.
///
/// [`current_time`]: AudioBackend::current_time
pub trait AudioBackend {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;

    /// Current time on the backend clock, in seconds.
    fn current_time(&self) -> f64;

    /// The master output node.
    fn destination(&self) -> NodeId;

    /// Create an oscillator at `frequency` Hz. It is silent until started.
    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId;

    /// Create a gain node with the given initial gain.
    fn create_gain(&mut self, gain: f32) -> NodeId;

    /// Create a filter of the given type with backend-default parameters.
    fn create_filter(&mut self, filter_type: FilterType) -> NodeId;

    /// Connect `from`'s output to `to`'s input. Connecting twice is a no-op.
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), BackendError>;

    /// Remove the edge from `from` to `to`.
    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), BackendError>;

    /// Start an oscillator now.
    fn start(&mut self, node: NodeId) -> Result<(), BackendError>;

    /// Stop `node` at time `when` and detach it from the graph.
    ///
    /// After `when` the id is dead.
    fn stop(&mut self, node: NodeId, when: f64) -> Result<(), BackendError>;

    /// Ramp a parameter to `target` over `duration` seconds from now.
    ///
    /// A zero duration sets the value instantly. The ramp starts from the
    /// parameter's current value, superseding any ramp in flight.
    fn ramp(
        &mut self,
        node: NodeId,
        param: ParamKind,
        target: f32,
        duration: f64,
        shape: RampShape,
    ) -> Result<(), BackendError>;

    /// Change an oscillator's waveform.
    fn set_waveform(&mut self, node: NodeId, waveform: Waveform) -> Result<(), BackendError>;

    /// Change a filter's response type.
    fn set_filter_type(&mut self, node: NodeId, filter_type: FilterType)
    -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_names_parse_back() {
        for w in Waveform::ALL {
            assert_eq!(w.name().parse::<Waveform>(), Ok(w));
        }
        assert_eq!("SAWTOOTH".parse::<Waveform>(), Ok(Waveform::Sawtooth));
        assert!("noise".parse::<Waveform>().is_err());
    }

    #[test]
    fn filter_type_names_parse_back() {
        for t in FilterType::ALL {
            assert_eq!(t.name().parse::<FilterType>(), Ok(t));
        }
        assert_eq!(
            "comb".parse::<FilterType>(),
            Err(UnknownName { kind: "filter type" })
        );
    }

    #[test]
    fn only_shelves_and_peaking_use_gain() {
        let using: Vec<_> = FilterType::ALL.iter().filter(|t| t.uses_gain()).collect();
        assert_eq!(
            using,
            [&FilterType::Lowshelf, &FilterType::Highshelf, &FilterType::Peaking]
        );
    }

    #[test]
    fn defaults_match_engine_defaults() {
        assert_eq!(Waveform::default(), Waveform::Sine);
        assert_eq!(FilterType::default(), FilterType::Lowpass);
    }

    #[cfg(feature = "std")]
    #[test]
    fn backend_error_display() {
        let a = NodeId::from_raw(3);
        let b = NodeId::from_raw(7);
        assert_eq!(
            BackendError::UnknownNode(a).to_string(),
            "node NodeId(3) not found"
        );
        assert_eq!(
            BackendError::NoSuchParam(a, ParamKind::Q).to_string(),
            "node NodeId(3) has no q parameter"
        );
        assert_eq!(
            BackendError::NotConnected(a, b).to_string(),
            "NodeId(3) is not connected to NodeId(7)"
        );
    }
}
