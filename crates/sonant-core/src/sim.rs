//! In-memory backend driven by an explicit clock.
//!
//! [`SimBackend`] keeps the node graph and every parameter ramp in memory and
//! renders nothing. Time only moves when [`advance`](SimBackend::advance) is
//! called, which makes it deterministic: tests and offline tools can step
//! the clock and inspect exactly which oscillators are live, what they are
//! connected to and where each parameter sits.
//!
//! Nodes scheduled with [`stop`](AudioBackend::stop) are torn down (their
//! edges removed, their id retired) once the clock passes the stop time.
//! Only live nodes are kept, so a long session costs no more than its
//! current graph.

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

use crate::backend::{AudioBackend, BackendError, FilterType, NodeId, ParamKind, Waveform};
use crate::ramp::{Ramp, RampShape};

/// Backend-default filter cutoff in Hz.
pub const DEFAULT_FILTER_FREQUENCY: f32 = 350.0;

/// Backend-default filter Q.
pub const DEFAULT_FILTER_Q: f32 = 1.0;

/// What a simulated node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimNodeKind {
    /// The master output.
    Destination,
    /// A tone generator.
    Oscillator(Waveform),
    /// A gain stage.
    Gain,
    /// A filter stage.
    Filter(FilterType),
}

#[derive(Debug, Clone)]
struct SimNode {
    kind: SimNodeKind,
    params: Vec<(ParamKind, Ramp)>,
    started: bool,
}

impl SimNode {
    fn new(kind: SimNodeKind, params: &[(ParamKind, f32)]) -> Self {
        Self {
            kind,
            params: params.iter().map(|&(p, v)| (p, Ramp::new(v))).collect(),
            started: false,
        }
    }

    fn param(&self, param: ParamKind) -> Option<&Ramp> {
        self.params.iter().find(|(p, _)| *p == param).map(|(_, r)| r)
    }

    fn param_mut(&mut self, param: ParamKind) -> Option<&mut Ramp> {
        self.params
            .iter_mut()
            .find(|(p, _)| *p == param)
            .map(|(_, r)| r)
    }
}

/// Deterministic, non-rendering [`AudioBackend`].
#[derive(Debug, Clone)]
pub struct SimBackend {
    now: f64,
    nodes: BTreeMap<NodeId, SimNode>,
    next_id: u32,
    /// Pending stop times of live nodes.
    stops: BTreeMap<NodeId, f64>,
    edges: Vec<(NodeId, NodeId)>,
    destination: NodeId,
}

impl SimBackend {
    /// Create a backend at time zero holding only the destination node.
    pub fn new() -> Self {
        let destination = NodeId::from_raw(0);
        Self {
            now: 0.0,
            nodes: BTreeMap::from([(destination, SimNode::new(SimNodeKind::Destination, &[]))]),
            next_id: 1,
            stops: BTreeMap::new(),
            edges: Vec::new(),
            destination,
        }
    }

    /// Move the clock forward by `seconds`, tearing down nodes whose stop
    /// time has passed.
    pub fn advance(&mut self, seconds: f64) {
        if seconds > 0.0 {
            self.now += seconds;
        }
        self.reap();
    }

    /// Kind of a live node.
    pub fn kind(&self, node: NodeId) -> Option<SimNodeKind> {
        self.node(node).map(|n| n.kind)
    }

    /// Whether `node` exists and has not been torn down.
    pub fn is_live(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Whether an oscillator has been started.
    pub fn is_started(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.started)
    }

    /// Scheduled stop time of a node, if any.
    pub fn stop_time(&self, node: NodeId) -> Option<f64> {
        self.stops.get(&node).copied()
    }

    /// Current value of a parameter.
    pub fn param_value(&self, node: NodeId, param: ParamKind) -> Option<f32> {
        self.node(node)
            .and_then(|n| n.param(param))
            .map(|r| r.value_at(self.now))
    }

    /// Value a parameter is ramping toward.
    pub fn param_target(&self, node: NodeId, param: ParamKind) -> Option<f32> {
        self.node(node).and_then(|n| n.param(param)).map(Ramp::target)
    }

    /// Full ramp state of a parameter.
    pub fn param_ramp(&self, node: NodeId, param: ParamKind) -> Option<Ramp> {
        self.node(node).and_then(|n| n.param(param)).copied()
    }

    /// Oscillator pitch after detune is applied, in Hz.
    pub fn effective_frequency(&self, node: NodeId) -> Option<f32> {
        let frequency = self.param_value(node, ParamKind::Frequency)?;
        let detune = self.param_value(node, ParamKind::Detune)?;
        Some(frequency * crate::math::cents_to_ratio(detune))
    }

    /// Nodes that `node` feeds.
    pub fn outputs(&self, node: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|(from, _)| *from == node)
            .map(|&(_, to)| to)
            .collect()
    }

    /// Nodes feeding `node`.
    pub fn inputs(&self, node: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|(_, to)| *to == node)
            .map(|&(from, _)| from)
            .collect()
    }

    /// Whether an edge from `from` to `to` exists.
    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Number of live nodes, the destination included.
    pub fn live_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Started oscillators that have not been torn down.
    pub fn running_oscillators(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| matches!(n.kind, SimNodeKind::Oscillator(_)) && n.started)
            .map(|(&id, _)| id)
            .collect()
    }

    fn node(&self, id: NodeId) -> Option<&SimNode> {
        self.nodes.get(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SimNode, BackendError> {
        self.nodes.get_mut(&id).ok_or(BackendError::UnknownNode(id))
    }

    fn insert(&mut self, node: SimNode) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        #[cfg(feature = "tracing")]
        tracing::trace!("sim_create: {id} {:?}", node.kind);
        self.nodes.insert(id, node);
        id
    }

    fn reap(&mut self) {
        let now = self.now;
        let due: Vec<NodeId> = self
            .stops
            .iter()
            .filter(|&(_, &at)| at <= now)
            .map(|(&id, _)| id)
            .collect();
        for id in due {
            self.stops.remove(&id);
            self.nodes.remove(&id);
            self.edges.retain(|&(from, to)| from != id && to != id);
            #[cfg(feature = "tracing")]
            tracing::trace!("sim_teardown: {id}");
        }
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for SimBackend {
    fn name(&self) -> &str {
        "sim"
    }

    fn current_time(&self) -> f64 {
        self.now
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> NodeId {
        self.insert(SimNode::new(
            SimNodeKind::Oscillator(waveform),
            &[(ParamKind::Frequency, frequency), (ParamKind::Detune, 0.0)],
        ))
    }

    fn create_gain(&mut self, gain: f32) -> NodeId {
        self.insert(SimNode::new(SimNodeKind::Gain, &[(ParamKind::Gain, gain)]))
    }

    fn create_filter(&mut self, filter_type: FilterType) -> NodeId {
        self.insert(SimNode::new(
            SimNodeKind::Filter(filter_type),
            &[
                (ParamKind::Frequency, DEFAULT_FILTER_FREQUENCY),
                (ParamKind::Q, DEFAULT_FILTER_Q),
                (ParamKind::FilterGain, 0.0),
            ],
        ))
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), BackendError> {
        self.node_mut(from)?;
        self.node_mut(to)?;
        if !self.is_connected(from, to) {
            self.edges.push((from, to));
        }
        Ok(())
    }

    fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<(), BackendError> {
        let pos = self
            .edges
            .iter()
            .position(|&edge| edge == (from, to))
            .ok_or(BackendError::NotConnected(from, to))?;
        self.edges.swap_remove(pos);
        Ok(())
    }

    fn start(&mut self, node: NodeId) -> Result<(), BackendError> {
        let n = self.node_mut(node)?;
        if !matches!(n.kind, SimNodeKind::Oscillator(_)) {
            return Err(BackendError::WrongNodeKind {
                node,
                expected: "oscillator",
            });
        }
        n.started = true;
        Ok(())
    }

    fn stop(&mut self, node: NodeId, when: f64) -> Result<(), BackendError> {
        if node == self.destination {
            return Err(BackendError::WrongNodeKind {
                node,
                expected: "stoppable",
            });
        }
        let when = when.max(self.now);
        if !self.nodes.contains_key(&node) {
            return Err(BackendError::UnknownNode(node));
        }
        self.stops.insert(node, when);
        self.reap();
        Ok(())
    }

    fn ramp(
        &mut self,
        node: NodeId,
        param: ParamKind,
        target: f32,
        duration: f64,
        shape: RampShape,
    ) -> Result<(), BackendError> {
        let now = self.now;
        self.node_mut(node)?
            .param_mut(param)
            .ok_or(BackendError::NoSuchParam(node, param))?
            .ramp_to(target, now, duration, shape);
        Ok(())
    }

    fn set_waveform(&mut self, node: NodeId, waveform: Waveform) -> Result<(), BackendError> {
        let n = self.node_mut(node)?;
        match &mut n.kind {
            SimNodeKind::Oscillator(w) => {
                *w = waveform;
                Ok(())
            }
            _ => Err(BackendError::WrongNodeKind {
                node,
                expected: "oscillator",
            }),
        }
    }

    fn set_filter_type(
        &mut self,
        node: NodeId,
        filter_type: FilterType,
    ) -> Result<(), BackendError> {
        let n = self.node_mut(node)?;
        match &mut n.kind {
            SimNodeKind::Filter(t) => {
                *t = filter_type;
                Ok(())
            }
            _ => Err(BackendError::WrongNodeKind {
                node,
                expected: "filter",
            }),
        }
    }
}
