//! # Linking
//!
//! Link rules and the operator that applies them during a traversal.
//!
//! A [`LinkRule`] describes a binary binding between the pass start `X`
//! and a candidate `Y` found by descending through `down` relations, turning,
//! and ascending through `up` relations. The binding is a new node `Z`:
//!
//! ```text
//!   X ──first──▶ Z ◀──second── Y
//! ```
//!
//! Before `Z` is created the latent existence check looks for an output edge
//! of `X` tagged `first` whose target already has an input edge tagged
//! `second` from `Y`. If one exists nothing is created, so re-running the
//! same traversal over an unchanged graph never grows it.

use crate::direction::Direction;
use crate::graph::{Edge, Graph, Node};
use crate::primitives::MAX_LABEL_LENGTH;
use crate::visitor::{Operator, Verdict, Visitor};
use crate::{KernelError, NodeId, Relation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How the scopes of `X` and `Y` must relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    /// Both sides must derive from the same origin.
    Same,
    /// Both sides must derive from different origins.
    #[default]
    Distinct,
    /// No constraint.
    Any,
}

impl ScopeMode {
    /// Symmetric compatibility test.
    #[must_use]
    pub fn compatible(self, a: NodeId, b: NodeId) -> bool {
        match self {
            ScopeMode::Same => a == b,
            ScopeMode::Distinct => a != b,
            ScopeMode::Any => true,
        }
    }
}

/// A binding rule applied by link steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRule {
    /// Rule name, used in logs and as the default binding label.
    pub name: String,
    /// Relation followed while descending.
    pub down: Relation,
    /// Relation followed while ascending.
    pub up: Relation,
    /// Relation of the binding edge from the pass start.
    pub first: Relation,
    /// Relation of the binding edge from the candidate.
    pub second: Relation,
    /// Scope constraint between start and candidate.
    #[serde(default)]
    pub scope: ScopeMode,
}

impl LinkRule {
    /// Build a rule with the default scope mode.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        down: Relation,
        up: Relation,
        first: Relation,
        second: Relation,
    ) -> Self {
        Self {
            name: name.into(),
            down,
            up,
            first,
            second,
            scope: ScopeMode::default(),
        }
    }

    /// Replace the scope mode.
    #[must_use]
    pub fn with_scope(mut self, scope: ScopeMode) -> Self {
        self.scope = scope;
        self
    }

    /// Reject empty or oversized names.
    pub fn validate(&self) -> Result<(), KernelError> {
        let fields = [
            ("name", self.name.as_str()),
            ("down", self.down.as_str()),
            ("up", self.up.as_str()),
            ("first", self.first.as_str()),
            ("second", self.second.as_str()),
        ];
        for (field, value) in fields {
            if value.is_empty() || value.len() > MAX_LABEL_LENGTH {
                return Err(KernelError::InvalidConfig(format!(
                    "link rule '{}': field '{}' must be 1..={} bytes",
                    self.name, field, MAX_LABEL_LENGTH
                )));
            }
        }
        Ok(())
    }

    /// Label given to binding nodes created by this rule.
    #[must_use]
    pub fn binding_label(&self, graph: &Graph, start: NodeId, candidate: NodeId) -> String {
        let label = |id| graph.node(id).map(|n| n.label.as_str()).unwrap_or("?");
        format!("{}({},{})", self.name, label(start), label(candidate))
    }

    /// Whether `start` and `candidate` are already bound under this rule.
    #[must_use]
    pub fn existing_binding(&self, graph: &Graph, start: NodeId, candidate: NodeId) -> Option<NodeId> {
        graph.find_binding(start, &self.first, candidate, &self.second)
    }
}

/// Operator applying one [`LinkRule`].
///
/// Requests are collected, not applied, so the graph is not mutated while
/// the traversal iterates it. Duplicate requests within one pass collapse.
#[derive(Debug)]
pub struct LinkingOperator<'r> {
    rule: &'r LinkRule,
    requests: BTreeSet<(NodeId, NodeId)>,
}

impl<'r> LinkingOperator<'r> {
    #[must_use]
    pub fn new(rule: &'r LinkRule) -> Self {
        Self {
            rule,
            requests: BTreeSet::new(),
        }
    }

    /// The collected `(start, candidate)` requests in deterministic order.
    #[must_use]
    pub fn into_requests(self) -> BTreeSet<(NodeId, NodeId)> {
        self.requests
    }
}

impl Operator for LinkingOperator<'_> {
    fn follow(&self, edge: &Edge, direction: Direction) -> bool {
        match direction {
            Direction::Input => edge.relation == self.rule.down,
            Direction::Output => edge.relation == self.rule.up,
            Direction::Same => false,
        }
    }

    fn check(&mut self, visitor: &Visitor, _last_edge: Option<&Edge>, _node: &Node) -> Verdict {
        match (visitor.is_ascending(), visitor.depth) {
            (false, 0) => Verdict::Expand,
            (false, _) => Verdict::TurnAndExpand,
            (true, _) => Verdict::Bind,
        }
    }

    fn compatible(&self, scope_a: NodeId, scope_b: NodeId) -> bool {
        self.rule.scope.compatible(scope_a, scope_b)
    }

    fn create_relation(&mut self, start: NodeId, candidate: NodeId) {
        self.requests.insert((start, candidate));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::traverse;
    use crate::{Timestamp, VisitId};

    fn rule() -> LinkRule {
        LinkRule::new(
            "pair",
            Relation::new("feeds"),
            Relation::new("feeds"),
            Relation::new("left"),
            Relation::new("right"),
        )
    }

    #[test]
    fn scope_modes_are_symmetric() {
        let (a, b) = (NodeId(1), NodeId(2));
        for mode in [ScopeMode::Same, ScopeMode::Distinct, ScopeMode::Any] {
            assert_eq!(mode.compatible(a, b), mode.compatible(b, a));
        }
        assert!(ScopeMode::Same.compatible(a, a));
        assert!(!ScopeMode::Distinct.compatible(a, a));
    }

    #[test]
    fn validate_rejects_empty_relation() {
        let mut bad = rule();
        bad.up = Relation::new("");
        assert!(matches!(bad.validate(), Err(KernelError::InvalidConfig(_))));
        assert!(rule().validate().is_ok());
    }

    #[test]
    fn operator_follows_only_rule_relations() {
        let mut graph = Graph::new();
        let x = graph.add_node("x", None, Timestamp(0));
        let y = graph.add_node("y", None, Timestamp(1));
        let p = graph.add_node("p", None, Timestamp(2));
        let q = graph.add_node("q", None, Timestamp(3));
        graph.add_edge(p, x, Relation::new("feeds"), Timestamp(4)).expect("edge");
        graph.add_edge(p, y, Relation::new("feeds"), Timestamp(5)).expect("edge");
        // q is connected through an unrelated relation and must be ignored.
        graph.add_edge(q, x, Relation::new("other"), Timestamp(6)).expect("edge");
        graph.add_edge(q, y, Relation::new("other"), Timestamp(7)).expect("edge");

        let rule = rule();
        let mut op = LinkingOperator::new(&rule);
        let stats = traverse(&mut graph, &mut op, Visitor::start(VisitId(1), x, 4))
            .expect("traverse");

        assert_eq!(stats.turns, 1);
        assert_eq!(op.into_requests().into_iter().collect::<Vec<_>>(), vec![(x, y)]);
    }

    #[test]
    fn binding_label_uses_endpoint_labels() {
        let mut graph = Graph::new();
        let x = graph.add_node("the", None, Timestamp(0));
        let y = graph.add_node("cat", None, Timestamp(1));
        assert_eq!(rule().binding_label(&graph, x, y), "pair(the,cat)");
    }
}
