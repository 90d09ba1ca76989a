//! # Core Type Definitions
//!
//! This module contains the value types shared by every part of the kernel:
//! - Arena identifiers (`NodeId`, `EdgeId`, `ContextId`)
//! - Logical clock values (`Timestamp`, `Round`, `VisitId`)
//! - Step binding targets (`Element`) and edge kinds (`Relation`)
//! - Error types (`KernelError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Use saturating arithmetic for counters to prevent overflow

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ARENA IDENTIFIERS
// =============================================================================

/// Identifier of a node in a context's arena.
/// Allocated monotonically by the arena, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Identifier of an edge in a context's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

/// Identifier of a processing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

// =============================================================================
// LOGICAL CLOCKS
// =============================================================================

/// Logical timestamp. Strictly increasing per context.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Get the raw clock value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Identifies one logical traversal pass.
///
/// A node carrying the current visit-id has already been visited in this
/// pass and is not entered again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VisitId(pub u64);

/// Iteration counter within a phase.
///
/// `Max` sorts after every finite round and marks work that must run only
/// once all finite rounds of its phase are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Round {
    Finite(u32),
    Max,
}

impl Round {
    /// The default round for freshly triggered work.
    pub const ZERO: Round = Round::Finite(0);

    /// The round following this one. `Max` stays `Max`.
    #[must_use]
    pub const fn next(self) -> Round {
        match self {
            Round::Finite(n) if n < u32::MAX => Round::Finite(n + 1),
            _ => Round::Max,
        }
    }

    /// The finite round number, if any.
    #[must_use]
    pub const fn as_finite(self) -> Option<u32> {
        match self {
            Round::Finite(n) => Some(n),
            Round::Max => None,
        }
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Round::Finite(n) => write!(f, "{}", n),
            Round::Max => write!(f, "max"),
        }
    }
}

// =============================================================================
// ELEMENTS & RELATIONS
// =============================================================================

/// The graph element a step operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Node(NodeId),
    Edge(EdgeId),
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Node(id) => write!(f, "{}", id),
            Element::Edge(id) => write!(f, "{}", id),
        }
    }
}

/// Kind tag of an edge ("synapse kind").
///
/// Edges are unique per `(source, target, relation)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation(pub String);

impl Relation {
    /// Create a new relation from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the relation as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the kernel.
///
/// - No silent failures
/// - Every error aborts the current drain; remaining steps stay queued
/// - The kernel never retries
#[derive(Debug, Error)]
pub enum KernelError {
    /// A uniqueness or ordering invariant would be broken.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The referenced node does not exist in the arena.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The referenced edge does not exist in the arena.
    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    /// A previous context is still connected to the model.
    #[error("Cannot connect: {0} is still connected")]
    NotYetConnectable(ContextId),

    /// The context no longer accepts this operation.
    #[error("Context {0} is closed")]
    ContextClosed(ContextId),

    /// The kernel configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A phase name could not be parsed.
    #[error("Unknown phase: {0}")]
    UnknownPhase(String),
}

impl KernelError {
    /// Shorthand for an `InvariantViolation` with a formatted message.
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_round_sorts_after_every_finite_round() {
        assert!(Round::Finite(0) < Round::Finite(1));
        assert!(Round::Finite(u32::MAX) < Round::Max);
        assert!(Round::ZERO < Round::Max);
    }

    #[test]
    fn round_next_saturates_into_max() {
        assert_eq!(Round::ZERO.next(), Round::Finite(1));
        assert_eq!(Round::Finite(u32::MAX).next(), Round::Max);
        assert_eq!(Round::Max.next(), Round::Max);
    }

    #[test]
    fn element_display() {
        assert_eq!(Element::Node(NodeId(3)).to_string(), "n3");
        assert_eq!(Element::Edge(EdgeId(7)).to_string(), "e7");
    }

    #[test]
    fn error_messages() {
        let err = KernelError::NotYetConnectable(ContextId(2));
        assert_eq!(err.to_string(), "Cannot connect: ctx2 is still connected");
    }
}
