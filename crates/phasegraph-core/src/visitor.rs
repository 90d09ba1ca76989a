//! # Visitor
//!
//! Directional traversal engine.
//!
//! A pass starts at one node with a fresh [`VisitId`] and walks `Input`
//! edges downward. At every node the [`Operator`] returns a [`Verdict`]:
//! keep descending, turn, both, bind, or halt. A turn spawns a child visitor
//! with the inverted direction whose origin is the turn node; it walks
//! `Output` edges upward and may bind candidates back to the pass start.
//!
//! ```text
//!            turn node ──Output──▶ candidate  (Bind → create_relation)
//!                ▲
//!              Input
//!                │
//!              start
//! ```
//!
//! ## Termination
//!
//! Every node entered is stamped with the pass's visit-id and is never
//! entered again in that pass, so cyclic graphs terminate. Descent and
//! ascent are additionally bounded by `max_depth`.

use crate::direction::Direction;
use crate::graph::{Edge, Graph, Node};
use crate::{KernelError, NodeId, VisitId};
use serde::{Deserialize, Serialize};

// =============================================================================
// VISITOR STATE
// =============================================================================

/// Per-step traversal state. Children share the visit-id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visitor {
    /// The traversal pass this visitor belongs to.
    pub visit: VisitId,
    /// Current polarity.
    pub direction: Direction,
    /// Node the whole pass started from.
    pub start: NodeId,
    /// Node this sub-traversal started from: `start` while descending,
    /// the turn node while ascending.
    pub origin: NodeId,
    /// Edges followed since `origin`.
    pub depth: usize,
    /// Maximum edges followed per sub-traversal.
    pub max_depth: usize,
}

impl Visitor {
    /// A descending visitor at the start of a pass.
    #[must_use]
    pub fn start(visit: VisitId, start: NodeId, max_depth: usize) -> Self {
        Self {
            visit,
            direction: Direction::Input,
            start,
            origin: start,
            depth: 0,
            max_depth,
        }
    }

    /// The visitor one edge further along.
    #[must_use]
    pub fn descend(self) -> Self {
        Self {
            depth: self.depth.saturating_add(1),
            ..self
        }
    }

    /// The child visitor spawned when turning at `at`.
    #[must_use]
    pub fn turn(self, at: NodeId) -> Self {
        Self {
            direction: self.direction.invert(),
            origin: at,
            depth: 0,
            ..self
        }
    }

    /// Whether this visitor is in the upward sub-phase.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.direction == Direction::Output
    }

    fn can_step(&self) -> bool {
        !self.direction.is_terminal() && self.depth < self.max_depth
    }
}

// =============================================================================
// OPERATOR
// =============================================================================

/// Decision returned by [`Operator::check`] for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep following edges in the current direction.
    Expand,
    /// Spawn an upward child here. Honored only while descending.
    Turn,
    /// Both `Turn` and `Expand`.
    TurnAndExpand,
    /// The node is a binding candidate. Honored only while ascending.
    Bind,
    /// Stop here.
    Halt,
}

/// Pluggable policy consulted by the traversal.
pub trait Operator {
    /// Whether to follow `edge` when moving in `direction`.
    fn follow(&self, _edge: &Edge, _direction: Direction) -> bool {
        true
    }

    /// Inspect `node`, reached through `last_edge` (`None` at the pass start).
    fn check(&mut self, visitor: &Visitor, last_edge: Option<&Edge>, node: &Node) -> Verdict;

    /// Symmetric scope compatibility between the pass start and a candidate.
    fn compatible(&self, scope_a: NodeId, scope_b: NodeId) -> bool;

    /// Request a relation between the pass start and a candidate.
    fn create_relation(&mut self, start: NodeId, candidate: NodeId);
}

// =============================================================================
// TRAVERSAL
// =============================================================================

/// Counters of one traversal pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    /// Nodes entered.
    pub visited: usize,
    /// Upward children spawned.
    pub turns: usize,
    /// Edges skipped because their far end was already visited.
    pub revisits: usize,
    /// Relations requested from the operator.
    pub requests: usize,
    /// Candidates rejected by scope compatibility.
    pub rejected: usize,
}

/// Run one pass from `visitor.start`.
///
/// The start node is stamped with the visit-id; if it already carries it,
/// nothing happens.
pub fn traverse<O: Operator + ?Sized>(
    graph: &mut Graph,
    op: &mut O,
    visitor: Visitor,
) -> Result<TraversalStats, KernelError> {
    let mut walker = Walker {
        graph,
        op,
        stats: TraversalStats::default(),
    };

    if walker.graph.mark_visited(visitor.start, visitor.visit)? {
        walker.stats.visited += 1;
        let verdict = walker
            .op
            .check(&visitor, None, walker.graph.node(visitor.start)?);
        walker.apply(visitor.start, visitor, verdict)?;
    }

    Ok(walker.stats)
}

struct Walker<'a, O: Operator + ?Sized> {
    graph: &'a mut Graph,
    op: &'a mut O,
    stats: TraversalStats,
}

impl<O: Operator + ?Sized> Walker<'_, O> {
    fn apply(&mut self, node: NodeId, visitor: Visitor, verdict: Verdict) -> Result<(), KernelError> {
        match (visitor.direction, verdict) {
            (Direction::Same, _) | (_, Verdict::Halt) => Ok(()),

            (Direction::Input, Verdict::Expand) => self.expand(node, visitor),
            (Direction::Input, Verdict::Turn) => self.ascend(node, visitor),
            (Direction::Input, Verdict::TurnAndExpand) => {
                self.ascend(node, visitor)?;
                self.expand(node, visitor)
            }
            (Direction::Input, Verdict::Bind) => Ok(()),

            (Direction::Output, Verdict::Bind) => {
                self.bind(node, visitor)?;
                Ok(())
            }
            (Direction::Output, Verdict::Expand | Verdict::TurnAndExpand) => {
                self.expand(node, visitor)
            }
            (Direction::Output, Verdict::Turn) => Ok(()),
        }
    }

    fn ascend(&mut self, node: NodeId, visitor: Visitor) -> Result<(), KernelError> {
        self.stats.turns += 1;
        // The turn node is already stamped; start from its edges.
        self.expand(node, visitor.turn(node))
    }

    fn expand(&mut self, node: NodeId, visitor: Visitor) -> Result<(), KernelError> {
        if !visitor.can_step() {
            return Ok(());
        }

        let direction = visitor.direction;
        let edge_ids = direction.neighbors(self.graph, node)?.to_vec();

        for edge_id in edge_ids {
            let next = {
                let edge = self.graph.edge(edge_id)?;
                if !self.op.follow(edge, direction) {
                    continue;
                }
                match direction.endpoint(edge) {
                    Some(next) => next,
                    None => continue,
                }
            };

            if !self.graph.mark_visited(next, visitor.visit)? {
                self.stats.revisits += 1;
                continue;
            }
            self.stats.visited += 1;

            let child = visitor.descend();
            let verdict = self.op.check(
                &child,
                Some(self.graph.edge(edge_id)?),
                self.graph.node(next)?,
            );
            self.apply(next, child, verdict)?;
        }

        Ok(())
    }

    fn bind(&mut self, candidate: NodeId, visitor: Visitor) -> Result<bool, KernelError> {
        if candidate == visitor.start {
            return Ok(false);
        }
        let start_scope = self.graph.node(visitor.start)?.origin;
        let candidate_scope = self.graph.node(candidate)?.origin;
        if !self.op.compatible(start_scope, candidate_scope) {
            self.stats.rejected += 1;
            return Ok(false);
        }
        self.op.create_relation(visitor.start, candidate);
        self.stats.requests += 1;
        Ok(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Relation, Timestamp};

    /// Records every node it sees and always expands.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<NodeId>,
    }

    impl Operator for Recorder {
        fn check(&mut self, _visitor: &Visitor, _last: Option<&Edge>, node: &Node) -> Verdict {
            self.seen.push(node.id);
            Verdict::Expand
        }

        fn compatible(&self, _a: NodeId, _b: NodeId) -> bool {
            true
        }

        fn create_relation(&mut self, _start: NodeId, _candidate: NodeId) {}
    }

    /// Turns at every ancestor and binds every candidate.
    #[derive(Default)]
    struct Binder {
        requests: Vec<(NodeId, NodeId)>,
    }

    impl Operator for Binder {
        fn check(&mut self, visitor: &Visitor, _last: Option<&Edge>, _node: &Node) -> Verdict {
            match (visitor.is_ascending(), visitor.depth) {
                (false, 0) => Verdict::Expand,
                (false, _) => Verdict::TurnAndExpand,
                (true, _) => Verdict::Bind,
            }
        }

        fn compatible(&self, a: NodeId, b: NodeId) -> bool {
            a != b
        }

        fn create_relation(&mut self, start: NodeId, candidate: NodeId) {
            self.requests.push((start, candidate));
        }
    }

    fn rel() -> Relation {
        Relation::new("feeds")
    }

    #[test]
    fn cycle_terminates_and_visits_once() {
        let mut graph = Graph::new();
        let a = graph.add_node("a", None, Timestamp(0));
        let b = graph.add_node("b", None, Timestamp(1));
        graph.add_edge(a, b, rel(), Timestamp(2)).expect("edge");
        graph.add_edge(b, a, rel(), Timestamp(3)).expect("edge");

        let mut op = Recorder::default();
        let stats = traverse(&mut graph, &mut op, Visitor::start(VisitId(1), a, 16))
            .expect("traverse");

        assert_eq!(op.seen, vec![a, b]);
        assert_eq!(stats.visited, 2);
        assert_eq!(stats.revisits, 1);
    }

    #[test]
    fn same_visit_id_does_not_reenter() {
        let mut graph = Graph::new();
        let a = graph.add_node("a", None, Timestamp(0));

        let mut op = Recorder::default();
        traverse(&mut graph, &mut op, Visitor::start(VisitId(4), a, 4)).expect("traverse");
        traverse(&mut graph, &mut op, Visitor::start(VisitId(4), a, 4)).expect("traverse");
        assert_eq!(op.seen, vec![a]);

        traverse(&mut graph, &mut op, Visitor::start(VisitId(5), a, 4)).expect("traverse");
        assert_eq!(op.seen, vec![a, a]);
    }

    #[test]
    fn depth_bound_limits_descent() {
        let mut graph = Graph::new();
        let nodes: Vec<NodeId> = (0..5)
            .map(|i| graph.add_node(format!("n{i}"), None, Timestamp(i)))
            .collect();
        // Chain n4 -> n3 -> n2 -> n1 -> n0, descend from n0.
        for pair in nodes.windows(2) {
            graph
                .add_edge(pair[1], pair[0], rel(), Timestamp(10))
                .expect("edge");
        }

        let mut op = Recorder::default();
        traverse(&mut graph, &mut op, Visitor::start(VisitId(1), nodes[0], 2)).expect("traverse");
        assert_eq!(op.seen, vec![nodes[0], nodes[1], nodes[2]]);
    }

    #[test]
    fn down_then_up_requests_sibling() {
        // p feeds both x and y: descending from x reaches p, ascending reaches y.
        let mut graph = Graph::new();
        let x = graph.add_node("x", None, Timestamp(0));
        let y = graph.add_node("y", None, Timestamp(1));
        let p = graph.add_node("p", None, Timestamp(2));
        graph.add_edge(p, x, rel(), Timestamp(3)).expect("edge");
        graph.add_edge(p, y, rel(), Timestamp(4)).expect("edge");

        let mut op = Binder::default();
        let stats = traverse(&mut graph, &mut op, Visitor::start(VisitId(1), x, 4))
            .expect("traverse");

        assert_eq!(op.requests, vec![(x, y)]);
        assert_eq!(stats.turns, 1);
        assert_eq!(stats.requests, 1);
    }

    #[test]
    fn two_branches_reaching_same_candidate_request_once() {
        // x has two parents p and q, both feeding y.
        let mut graph = Graph::new();
        let x = graph.add_node("x", None, Timestamp(0));
        let y = graph.add_node("y", None, Timestamp(1));
        let p = graph.add_node("p", None, Timestamp(2));
        let q = graph.add_node("q", None, Timestamp(3));
        for parent in [p, q] {
            graph.add_edge(parent, x, rel(), Timestamp(4)).expect("edge");
            graph.add_edge(parent, y, rel(), Timestamp(5)).expect("edge");
        }

        let mut op = Binder::default();
        let stats = traverse(&mut graph, &mut op, Visitor::start(VisitId(1), x, 4))
            .expect("traverse");

        assert_eq!(op.requests, vec![(x, y)]);
        assert_eq!(stats.turns, 2);
    }

    #[test]
    fn incompatible_scope_is_rejected() {
        let mut graph = Graph::new();
        let x = graph.add_node("x", None, Timestamp(0));
        // y shares x's scope.
        let y = graph.add_node("y", Some(x), Timestamp(1));
        let p = graph.add_node("p", None, Timestamp(2));
        graph.add_edge(p, x, rel(), Timestamp(3)).expect("edge");
        graph.add_edge(p, y, rel(), Timestamp(4)).expect("edge");

        let mut op = Binder::default();
        let stats = traverse(&mut graph, &mut op, Visitor::start(VisitId(1), x, 4))
            .expect("traverse");

        assert!(op.requests.is_empty());
        assert_eq!(stats.rejected, 1);
    }

    #[test]
    fn turn_resets_depth_and_inverts() {
        let v = Visitor::start(VisitId(1), NodeId(0), 3).descend().descend();
        let child = v.turn(NodeId(7));
        assert_eq!(child.direction, Direction::Output);
        assert_eq!(child.origin, NodeId(7));
        assert_eq!(child.start, NodeId(0));
        assert_eq!(child.depth, 0);
        assert_eq!(child.visit, v.visit);
    }
}
