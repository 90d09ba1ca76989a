//! # Graph Arena
//!
//! Node and edge storage for one context.
//!
//! Nodes and edges live in `BTreeMap` arenas keyed by integer id. Edges store
//! endpoint ids and nodes store incident edge ids, so the cyclic graph has no
//! ownership cycles. Nothing is deleted while the owning context lives.
//!
//! The `(source, target, relation)` triple of an edge is unique. Callers check
//! [`Graph::link_exists`] first; [`Graph::add_edge`] rejects a duplicate
//! triple as an invariant violation.

use crate::direction::Direction;
use crate::step::StepKind;
use crate::{EdgeId, Element, KernelError, NodeId, Relation, Timestamp, VisitId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// NODE
// =============================================================================

/// A graph vertex ("activation").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Arena identifier.
    pub id: NodeId,
    /// Free-form label supplied by the creator.
    pub label: String,
    /// When the node was created.
    pub created: Timestamp,
    /// The input node this node derives from. Input nodes are their own origin.
    /// Used as the node's scope by linking operators.
    pub origin: NodeId,
    /// Opaque frequency counter maintained by count steps.
    pub frequency: u64,
    /// Anneal value in millionths of `ANNEAL_SCALE`.
    pub anneal: u32,
    /// Set by the close step.
    pub is_final: bool,
    fired: Option<Timestamp>,
    inputs: Vec<EdgeId>,
    outputs: Vec<EdgeId>,
    pending: BTreeSet<StepKind>,
    last_visit: Option<VisitId>,
}

impl Node {
    fn new(id: NodeId, label: String, origin: NodeId, created: Timestamp) -> Self {
        Self {
            id,
            label,
            created,
            origin,
            frequency: 0,
            anneal: 0,
            is_final: false,
            fired: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            pending: BTreeSet::new(),
            last_visit: None,
        }
    }

    /// When the node fired, if it has.
    #[must_use]
    pub fn fired(&self) -> Option<Timestamp> {
        self.fired
    }

    /// Whether the node has fired.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.is_some()
    }

    /// Incident edges in the given polarity, in creation order.
    ///
    /// `Input` yields edges whose target is this node, `Output` edges whose
    /// source is this node, `Same` nothing.
    #[must_use]
    pub fn edges(&self, direction: Direction) -> &[EdgeId] {
        match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
            Direction::Same => &[],
        }
    }

    /// Whether a step of `kind` is pending for this node.
    #[must_use]
    pub fn is_pending(&self, kind: StepKind) -> bool {
        self.pending.contains(&kind)
    }

    /// The visit-id of the last traversal pass that entered this node.
    #[must_use]
    pub fn last_visit(&self) -> Option<VisitId> {
        self.last_visit
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// A directed graph edge ("link").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relation: Relation,
    pub created: Timestamp,
    pending: BTreeSet<StepKind>,
}

impl Edge {
    /// Whether a step of `kind` is pending for this edge.
    #[must_use]
    pub fn is_pending(&self, kind: StepKind) -> bool {
        self.pending.contains(&kind)
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// Arena of nodes and edges.
///
/// Uses `BTreeMap` exclusively for deterministic ordering.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    /// Uniqueness index: (source, target, relation) -> edge
    triples: BTreeMap<(NodeId, NodeId, Relation), EdgeId>,
    next_node_id: u64,
    next_edge_id: u64,
}

impl Graph {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node. With no `origin` the node is its own origin.
    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        origin: Option<NodeId>,
        created: Timestamp,
    ) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.saturating_add(1);
        let node = Node::new(id, label.into(), origin.unwrap_or(id), created);
        self.nodes.insert(id, node);
        id
    }

    /// Create the edge `source -relation-> target`.
    ///
    /// # Errors
    /// - `NodeNotFound` if either endpoint is missing
    /// - `InvariantViolation` if the triple already exists
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        relation: Relation,
        created: Timestamp,
    ) -> Result<EdgeId, KernelError> {
        self.node(source)?;
        self.node(target)?;

        let triple = (source, target, relation);
        if let Some(existing) = self.triples.get(&triple) {
            return Err(KernelError::invariant(format!(
                "edge {} -{}-> {} already exists as {}",
                source, triple.2, target, existing
            )));
        }

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id = self.next_edge_id.saturating_add(1);

        self.node_mut(source)?.outputs.push(id);
        self.node_mut(target)?.inputs.push(id);
        self.edges.insert(
            id,
            Edge {
                id,
                source,
                target,
                relation: triple.2.clone(),
                created,
                pending: BTreeSet::new(),
            },
        );
        self.triples.insert(triple, id);
        Ok(id)
    }

    /// Whether `source -relation-> target` exists.
    #[must_use]
    pub fn link_exists(&self, source: NodeId, target: NodeId, relation: &Relation) -> bool {
        self.find_edge(source, target, relation).is_some()
    }

    /// The edge `source -relation-> target`, if it exists.
    #[must_use]
    pub fn find_edge(&self, source: NodeId, target: NodeId, relation: &Relation) -> Option<EdgeId> {
        self.triples
            .get(&(source, target, relation.clone()))
            .copied()
    }

    /// Latent binding lookup.
    ///
    /// Searches the output edges of `from` tagged `first` for a target that
    /// already has an input edge tagged `second` from `other`. Returns that
    /// target, i.e. the node that already binds the pair.
    #[must_use]
    pub fn find_binding(
        &self,
        from: NodeId,
        first: &Relation,
        other: NodeId,
        second: &Relation,
    ) -> Option<NodeId> {
        let node = self.nodes.get(&from)?;
        node.outputs
            .iter()
            .filter_map(|id| self.edges.get(id))
            .filter(|edge| &edge.relation == first)
            .map(|edge| edge.target)
            .find(|&target| self.link_exists(other, target, second))
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Result<&Node, KernelError> {
        self.nodes.get(&id).ok_or(KernelError::NodeNotFound(id))
    }

    /// Look up a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, KernelError> {
        self.nodes.get_mut(&id).ok_or(KernelError::NodeNotFound(id))
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge, KernelError> {
        self.edges.get(&id).ok_or(KernelError::EdgeNotFound(id))
    }

    /// Whether the arena holds this node.
    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Set the fired timestamp of a node. Allowed once.
    pub fn set_fired(&mut self, id: NodeId, at: Timestamp) -> Result<(), KernelError> {
        let node = self.node_mut(id)?;
        if let Some(previous) = node.fired {
            return Err(KernelError::invariant(format!(
                "{} already fired at t{}",
                id,
                previous.value()
            )));
        }
        node.fired = Some(at);
        Ok(())
    }

    /// Enter a node within a traversal pass.
    ///
    /// Returns `false` if the node already carries `visit`.
    pub fn mark_visited(&mut self, id: NodeId, visit: VisitId) -> Result<bool, KernelError> {
        let node = self.node_mut(id)?;
        if node.last_visit == Some(visit) {
            return Ok(false);
        }
        node.last_visit = Some(visit);
        Ok(true)
    }

    /// Set the pending flag for `(element, kind)`.
    ///
    /// Returns `false` if it was already set.
    pub fn mark_pending(&mut self, element: Element, kind: StepKind) -> Result<bool, KernelError> {
        Ok(self.pending_set_mut(element)?.insert(kind))
    }

    /// Clear the pending flag for `(element, kind)`.
    ///
    /// Returns `false` if it was not set.
    pub fn clear_pending(&mut self, element: Element, kind: StepKind) -> Result<bool, KernelError> {
        Ok(self.pending_set_mut(element)?.remove(&kind))
    }

    /// Whether `(element, kind)` is flagged pending.
    pub fn is_pending(&self, element: Element, kind: StepKind) -> Result<bool, KernelError> {
        Ok(match element {
            Element::Node(id) => self.node(id)?.is_pending(kind),
            Element::Edge(id) => self.edge(id)?.is_pending(kind),
        })
    }

    fn pending_set_mut(&mut self, element: Element) -> Result<&mut BTreeSet<StepKind>, KernelError> {
        match element {
            Element::Node(id) => Ok(&mut self.node_mut(id)?.pending),
            Element::Edge(id) => self
                .edges
                .get_mut(&id)
                .map(|edge| &mut edge.pending)
                .ok_or(KernelError::EdgeNotFound(id)),
        }
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// All edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
