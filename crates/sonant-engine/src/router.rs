//! Signal routing between oscillators, filters and master.
//!
//! The routing table maps each source to its current destination and to the
//! set of destinations it may legally use. Master is always legal. Sources
//! and eligibility are fixed as the topology is built:
//!
//! | Source     | Eligible destinations               |
//! |------------|-------------------------------------|
//! | oscillator | every filter (now and later), master |
//! | filter     | master only                         |
//!
//! Filters never feed filters or oscillators, so the graph cannot contain a
//! cycle. A rejected route is logged and leaves the table and the backend
//! wiring untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use sonant_core::{AudioBackend, NodeId};

use crate::error::{EngineError, Result};

/// Engine-side identity of a routable node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "String", try_from = "String")
)]
pub enum NodeRef {
    /// Oscillator by index.
    Oscillator(usize),
    /// Filter by index.
    Filter(usize),
    /// The master output sentinel.
    Master,
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Oscillator(i) => write!(f, "osc{i}"),
            NodeRef::Filter(i) => write!(f, "filter{i}"),
            NodeRef::Master => f.write_str("master"),
        }
    }
}

/// A string that names no node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node reference '{0}' (expected oscN, filterN or master)")]
pub struct ParseNodeRefError(String);

impl FromStr for NodeRef {
    type Err = ParseNodeRefError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bad = || ParseNodeRefError(s.to_string());
        if s == "master" {
            return Ok(NodeRef::Master);
        }
        if let Some(n) = s.strip_prefix("osc") {
            return n.parse().map(NodeRef::Oscillator).map_err(|_| bad());
        }
        if let Some(n) = s.strip_prefix("filter") {
            return n.parse().map(NodeRef::Filter).map_err(|_| bad());
        }
        Err(bad())
    }
}

impl From<NodeRef> for String {
    fn from(node: NodeRef) -> Self {
        node.to_string()
    }
}

impl TryFrom<String> for NodeRef {
    type Error = ParseNodeRefError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone)]
struct RouteEntry {
    output: NodeId,
    destination: NodeRef,
    eligible: BTreeSet<NodeRef>,
}

/// The routing table plus the backend wiring it controls.
#[derive(Debug, Clone)]
pub struct Router {
    routes: BTreeMap<NodeRef, RouteEntry>,
    inputs: BTreeMap<NodeRef, NodeId>,
    master: NodeId,
}

impl Router {
    /// Create a router whose master sentinel is backed by `master`.
    pub fn new(master: NodeId) -> Self {
        Self {
            routes: BTreeMap::new(),
            inputs: BTreeMap::from([(NodeRef::Master, master)]),
            master,
        }
    }

    /// Register oscillator `index` with output `output`, wired to master.
    ///
    /// Every filter already registered becomes eligible for it.
    pub fn add_oscillator<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        index: usize,
        output: NodeId,
    ) -> Result<()> {
        let eligible = self
            .inputs
            .keys()
            .copied()
            .filter(|node| matches!(node, NodeRef::Filter(_)))
            .collect();
        self.register(backend, NodeRef::Oscillator(index), output, eligible)
    }

    /// Register filter `index` backed by `node`, wired to master.
    ///
    /// The filter becomes eligible for every registered oscillator.
    pub fn add_filter<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        index: usize,
        node: NodeId,
    ) -> Result<()> {
        let filter = NodeRef::Filter(index);
        self.register(backend, filter, node, BTreeSet::new())?;
        self.inputs.insert(filter, node);
        for (source, entry) in &mut self.routes {
            if matches!(source, NodeRef::Oscillator(_)) {
                entry.eligible.insert(filter);
            }
        }
        Ok(())
    }

    /// Route `from` into `to`, returning the previous destination.
    ///
    /// Rejects unknown nodes, master as a source, and destinations outside
    /// the source's eligible set. On rejection nothing changes.
    pub fn set_route<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        from: NodeRef,
        to: NodeRef,
    ) -> Result<NodeRef> {
        if let Err(err) = self.check(from, to) {
            tracing::warn!(%from, %to, %err, "route rejected");
            return Err(err);
        }
        let Some(entry) = self.routes.get_mut(&from) else {
            return Err(EngineError::InvalidSource(from));
        };
        let previous = entry.destination;
        if previous == to {
            return Ok(previous);
        }
        let (Some(&old_input), Some(&new_input)) =
            (self.inputs.get(&previous), self.inputs.get(&to))
        else {
            return Err(EngineError::IneligibleRoute { from, to });
        };

        backend.disconnect(entry.output, old_input)?;
        if let Err(err) = backend.connect(entry.output, new_input) {
            // Put the old edge back so the table still matches the wiring.
            backend.connect(entry.output, old_input)?;
            return Err(err.into());
        }
        entry.destination = to;

        tracing::debug!(%from, %previous, %to, "route changed");
        Ok(previous)
    }

    /// Current destination of `from`.
    pub fn destination(&self, from: NodeRef) -> Option<NodeRef> {
        self.routes.get(&from).map(|e| e.destination)
    }

    /// Whether `from` may be routed into `to`.
    pub fn is_eligible(&self, from: NodeRef, to: NodeRef) -> bool {
        self.check(from, to).is_ok()
    }

    /// Eligible destinations of `from`, master first.
    pub fn eligible(&self, from: NodeRef) -> Vec<NodeRef> {
        match self.routes.get(&from) {
            Some(entry) => std::iter::once(NodeRef::Master)
                .chain(entry.eligible.iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every `(source, destination)` pair, oscillators before filters, each
    /// in index order.
    pub fn routes(&self) -> impl Iterator<Item = (NodeRef, NodeRef)> + '_ {
        self.routes.iter().map(|(&from, e)| (from, e.destination))
    }

    fn register<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        source: NodeRef,
        output: NodeId,
        eligible: BTreeSet<NodeRef>,
    ) -> Result<()> {
        backend.connect(output, self.master)?;
        self.routes.insert(
            source,
            RouteEntry {
                output,
                destination: NodeRef::Master,
                eligible,
            },
        );
        Ok(())
    }

    fn check(&self, from: NodeRef, to: NodeRef) -> Result<()> {
        let entry = match (from, self.routes.get(&from)) {
            (_, Some(entry)) => entry,
            (NodeRef::Oscillator(i), None) => return Err(EngineError::UnknownOscillator(i)),
            (NodeRef::Filter(i), None) => return Err(EngineError::UnknownFilter(i)),
            (NodeRef::Master, None) => return Err(EngineError::InvalidSource(from)),
        };
        match to {
            NodeRef::Master => Ok(()),
            _ if entry.eligible.contains(&to) => Ok(()),
            NodeRef::Filter(i) if !self.inputs.contains_key(&to) => {
                Err(EngineError::UnknownFilter(i))
            }
            NodeRef::Oscillator(i) if !self.routes.contains_key(&to) => {
                Err(EngineError::UnknownOscillator(i))
            }
            _ => Err(EngineError::IneligibleRoute { from, to }),
        }
    }
}
