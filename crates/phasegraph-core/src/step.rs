//! # Steps
//!
//! A step is one unit of deferred work bound to a graph element.
//!
//! Steps are a closed tagged variant. The context dispatches them by pattern
//! matching in [`crate::Context`]; there is no dynamic dispatch and no
//! registry of step types.
//!
//! ## Re-entrancy
//!
//! Every element records which step kinds are pending for it. At most one
//! step per `(element, kind)` is queued at any time:
//! - `Context::add_step` checks and sets the flag, returning `false` for a duplicate
//! - `Context::enqueue` treats a duplicate as an invariant violation
//! - processing clears the flag before the step's effect runs

use crate::phase::Phase;
use crate::{EdgeId, Element, NodeId, Round};
use serde::{Deserialize, Serialize};

/// Discriminant of a [`Step`]. Used for pending flags and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Count,
    Fire,
    Propagate,
    Link,
    Instantiate,
    Anneal,
    Close,
}

impl StepKind {
    /// Every kind, in phase order.
    pub const ALL: [StepKind; 7] = [
        StepKind::Count,
        StepKind::Fire,
        StepKind::Propagate,
        StepKind::Link,
        StepKind::Instantiate,
        StepKind::Anneal,
        StepKind::Close,
    ];

    /// The phase every step of this kind runs in.
    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            StepKind::Count => Phase::Counting,
            StepKind::Fire | StepKind::Propagate => Phase::Inference,
            StepKind::Link => Phase::Linking,
            StepKind::Instantiate => Phase::Instantiation,
            StepKind::Anneal => Phase::Anneal,
            StepKind::Close => Phase::Close,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StepKind::Count => "count",
            StepKind::Fire => "fire",
            StepKind::Propagate => "propagate",
            StepKind::Link => "link",
            StepKind::Instantiate => "instantiate",
            StepKind::Anneal => "anneal",
            StepKind::Close => "close",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Bump the node's frequency counter.
    Count { node: NodeId },
    /// Mark the node fired and schedule its follow-up work.
    Fire { node: NodeId },
    /// Carry a firing across one edge.
    Propagate { edge: EdgeId },
    /// Run the registered linking rules from the node.
    Link { node: NodeId },
    /// Induce an instance node for the node.
    Instantiate { node: NodeId },
    /// One round of the anneal fixed point.
    Anneal { node: NodeId, round: Round },
    /// Finalize the node once everything else has run.
    Close { node: NodeId },
}

impl Step {
    /// The kind tag of this step.
    #[must_use]
    pub const fn kind(&self) -> StepKind {
        match self {
            Step::Count { .. } => StepKind::Count,
            Step::Fire { .. } => StepKind::Fire,
            Step::Propagate { .. } => StepKind::Propagate,
            Step::Link { .. } => StepKind::Link,
            Step::Instantiate { .. } => StepKind::Instantiate,
            Step::Anneal { .. } => StepKind::Anneal,
            Step::Close { .. } => StepKind::Close,
        }
    }

    /// The phase this step runs in. Fixed per kind.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.kind().phase()
    }

    /// The round this step runs in.
    ///
    /// Round 0 unless the variant says otherwise: anneal carries its own
    /// round, close always runs in `Round::Max`.
    #[must_use]
    pub const fn round(&self) -> Round {
        match self {
            Step::Anneal { round, .. } => *round,
            Step::Close { .. } => Round::Max,
            _ => Round::ZERO,
        }
    }

    /// The element this step operates on.
    #[must_use]
    pub const fn element(&self) -> Element {
        match self {
            Step::Count { node }
            | Step::Fire { node }
            | Step::Link { node }
            | Step::Instantiate { node }
            | Step::Anneal { node, .. }
            | Step::Close { node } => Element::Node(*node),
            Step::Propagate { edge } => Element::Edge(*edge),
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}) @{}/{}",
            self.kind(),
            self.element(),
            self.phase(),
            self.round()
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
