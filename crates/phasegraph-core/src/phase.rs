//! # Processing Phases
//!
//! Coarse ordering tags that partition steps into processing stages.
//!
//! The global order is the explicit [`PHASE_ORDER`] table, not the enum
//! declaration order. Reordering variants in source never changes scheduling.
//!
//! | Rank | Phase | Work |
//! |------|-------|------|
//! | 0 | Counting | Frequency bookkeeping for new nodes |
//! | 1 | Inference | Firing and propagation along edges |
//! | 2 | Linking | Visitor traversals that materialize bindings |
//! | 3 | Instantiation | Structural induction of instance nodes |
//! | 4 | Anneal | Round-indexed fixed-point iteration |
//! | 5 | Close | Finalization, runs in `Round::Max` |

use crate::KernelError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// A processing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Counting,
    Inference,
    Linking,
    Instantiation,
    Anneal,
    Close,
}

/// Global phase order, earliest first.
pub const PHASE_ORDER: [Phase; 6] = [
    Phase::Counting,
    Phase::Inference,
    Phase::Linking,
    Phase::Instantiation,
    Phase::Anneal,
    Phase::Close,
];

impl Phase {
    /// Position of this phase in [`PHASE_ORDER`].
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Phase::Counting => 0,
            Phase::Inference => 1,
            Phase::Linking => 2,
            Phase::Instantiation => 3,
            Phase::Anneal => 4,
            Phase::Close => 5,
        }
    }

    /// Lowercase name used in configuration files and CLI arguments.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::Counting => "counting",
            Phase::Inference => "inference",
            Phase::Linking => "linking",
            Phase::Instantiation => "instantiation",
            Phase::Anneal => "anneal",
            Phase::Close => "close",
        }
    }

    /// The phase ranked right after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Phase> {
        PHASE_ORDER.get(usize::from(self.rank()) + 1).copied()
    }

    /// The phase ranked right before this one, if any.
    #[must_use]
    pub fn previous(self) -> Option<Phase> {
        usize::from(self.rank())
            .checked_sub(1)
            .and_then(|i| PHASE_ORDER.get(i).copied())
    }

    /// The last phase in the global order.
    #[must_use]
    pub const fn last() -> Phase {
        Phase::Close
    }
}

impl Ord for Phase {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Phase {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PHASE_ORDER
            .iter()
            .copied()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| KernelError::UnknownPhase(s.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
