//! # Traversal Direction
//!
//! Polarity of graph traversal.
//!
//! - `Input`: toward upstream neighbors (follow edges from target to source)
//! - `Output`: toward downstream neighbors (follow edges from source to target)
//! - `Same`: identity polarity; has no neighbors and terminates traversal
//!
//! Composition treats the variants as signs (`Output = +1`, `Input = -1`,
//! `Same = 0`): an absolute direction composed with a relative move continues
//! (`Output`), reverses (`Input`) or terminates (`Same`).

use crate::graph::{Edge, Graph};
use crate::{EdgeId, KernelError, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
    Same,
}

impl Direction {
    /// The opposite polarity. `Same` stays `Same`.
    #[must_use]
    pub const fn invert(self) -> Direction {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
            Direction::Same => Direction::Same,
        }
    }

    /// Compose this absolute direction with a relative move.
    ///
    /// | self \ relative | Output | Input | Same |
    /// |---|---|---|---|
    /// | Input | Input | Output | Same |
    /// | Output | Output | Input | Same |
    /// | Same | Same | Same | Same |
    #[must_use]
    pub const fn next(self, relative: Direction) -> Direction {
        match (self, relative) {
            (Direction::Same, _) | (_, Direction::Same) => Direction::Same,
            (current, Direction::Output) => current,
            (current, Direction::Input) => current.invert(),
        }
    }

    /// Whether traversal in this direction can make progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Direction::Same)
    }

    /// The node's incident edges in this polarity.
    pub fn neighbors(self, graph: &Graph, node: NodeId) -> Result<&[EdgeId], KernelError> {
        Ok(graph.node(node)?.edges(self))
    }

    /// The endpoint of `edge` on this polarity's side.
    ///
    /// Moving `Input` across an edge lands on its source, moving `Output`
    /// lands on its target.
    #[must_use]
    pub fn endpoint(self, edge: &Edge) -> Option<NodeId> {
        match self {
            Direction::Input => Some(edge.source),
            Direction::Output => Some(edge.target),
            Direction::Same => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
            Direction::Same => f.write_str("same"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Relation, Timestamp};

    const ALL: [Direction; 3] = [Direction::Input, Direction::Output, Direction::Same];

    #[test]
    fn invert_is_involution() {
        for d in ALL {
            assert_eq!(d.invert().invert(), d);
        }
        assert_eq!(Direction::Input.invert(), Direction::Output);
    }

    #[test]
    fn same_absorbs() {
        for d in ALL {
            assert_eq!(d.next(Direction::Same), Direction::Same);
            assert_eq!(Direction::Same.next(d), Direction::Same);
        }
    }

    #[test]
    fn continue_and_reverse() {
        assert_eq!(Direction::Input.next(Direction::Output), Direction::Input);
        assert_eq!(Direction::Input.next(Direction::Input), Direction::Output);
        assert_eq!(Direction::Output.next(Direction::Input), Direction::Input);
        assert!(Direction::Input.next(Direction::Same).is_terminal());
    }

    #[test]
    fn neighbors_and_endpoints() {
        let mut graph = Graph::new();
        let a = graph.add_node("a", None, Timestamp(0));
        let b = graph.add_node("b", None, Timestamp(1));
        let e = graph
            .add_edge(a, b, Relation::new("next"), Timestamp(2))
            .expect("edge");
        let edge = graph.edge(e).expect("edge").clone();

        assert_eq!(Direction::Output.neighbors(&graph, a).expect("n"), &[e]);
        assert_eq!(Direction::Input.neighbors(&graph, b).expect("n"), &[e]);
        assert!(Direction::Same.neighbors(&graph, a).expect("n").is_empty());

        assert_eq!(Direction::Output.endpoint(&edge), Some(b));
        assert_eq!(Direction::Input.endpoint(&edge), Some(a));
        assert_eq!(Direction::Same.endpoint(&edge), None);
    }
}
