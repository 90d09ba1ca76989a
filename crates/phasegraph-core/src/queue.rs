//! # Step Queue
//!
//! Ordered multiset of pending steps.
//!
//! Steps are keyed by [`QueueKey`] ascending:
//! 1. `phase` by explicit rank
//! 2. `round` with `Round::Max` after every finite round
//! 3. `timestamp` assigned by the owning context at enqueue time
//! 4. `seq`, an insertion counter owned by the queue
//!
//! The insertion counter makes the order strict even for identical
//! `(phase, round, timestamp)` tuples, so duplicates are all retained.
//! A key never changes once assigned.

use crate::phase::Phase;
use crate::step::{Step, StepKind};
use crate::{Element, Round, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Composite sort key of a queued step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueKey {
    pub phase: Phase,
    pub round: Round,
    pub timestamp: Timestamp,
    pub seq: u64,
}

impl std::fmt::Display for QueueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, t{}, #{})",
            self.phase,
            self.round,
            self.timestamp.value(),
            self.seq
        )
    }
}

/// Pending steps ordered by key, with an `(element, kind)` index for
/// cancellation.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: BTreeMap<QueueKey, Step>,
    index: BTreeMap<(Element, StepKind), BTreeSet<QueueKey>>,
    next_seq: u64,
}

impl Queue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a step, computing its key from the step and `timestamp`.
    ///
    /// O(log n). Returns the assigned key.
    pub fn push(&mut self, step: Step, timestamp: Timestamp) -> QueueKey {
        let key = QueueKey {
            phase: step.phase(),
            round: step.round(),
            timestamp,
            seq: self.next_seq,
        };
        self.next_seq = self.next_seq.saturating_add(1);

        self.index
            .entry((step.element(), step.kind()))
            .or_default()
            .insert(key);
        self.entries.insert(key, step);
        key
    }

    /// The minimum-key step, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<(&QueueKey, &Step)> {
        self.entries.first_key_value()
    }

    /// Phase of the minimum-key step.
    #[must_use]
    pub fn peek_phase(&self) -> Option<Phase> {
        self.entries.first_key_value().map(|(k, _)| k.phase)
    }

    /// Remove and return the minimum-key step.
    pub fn pop(&mut self) -> Option<(QueueKey, Step)> {
        let (key, step) = self.entries.pop_first()?;
        self.unindex(&step, &key);
        Some((key, step))
    }

    /// Remove every pending step for `(element, kind)`.
    ///
    /// Returns the removed steps in key order; empty if none were pending.
    pub fn remove(&mut self, element: Element, kind: StepKind) -> Vec<Step> {
        let Some(keys) = self.index.remove(&(element, kind)) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|key| self.entries.remove(key))
            .collect()
    }

    /// Whether a step for `(element, kind)` is pending.
    #[must_use]
    pub fn contains(&self, element: Element, kind: StepKind) -> bool {
        self.index
            .get(&(element, kind))
            .is_some_and(|keys| !keys.is_empty())
    }

    /// Number of pending steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no steps are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending steps in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&QueueKey, &Step)> {
        self.entries.iter()
    }

    /// Count of pending steps per phase, in phase order.
    #[must_use]
    pub fn pending_by_phase(&self) -> BTreeMap<Phase, usize> {
        let mut counts = BTreeMap::new();
        for key in self.entries.keys() {
            let count: &mut usize = counts.entry(key.phase).or_default();
            *count = count.saturating_add(1);
        }
        counts
    }

    fn unindex(&mut self, step: &Step, key: &QueueKey) {
        let slot = (step.element(), step.kind());
        if let Some(keys) = self.index.get_mut(&slot) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&slot);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeId;

    fn fire(n: u64) -> Step {
        Step::Fire { node: NodeId(n) }
    }

    fn count(n: u64) -> Step {
        Step::Count { node: NodeId(n) }
    }

    #[test]
    fn pops_phase_before_timestamp() {
        let mut queue = Queue::new();
        queue.push(fire(1), Timestamp(5));
        queue.push(count(2), Timestamp(10));
        queue.push(fire(3), Timestamp(3));

        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|(k, s)| (k.phase, k.timestamp.value(), s))
            .collect();

        assert_eq!(
            order,
            vec![
                (Phase::Counting, 10, count(2)),
                (Phase::Inference, 3, fire(3)),
                (Phase::Inference, 5, fire(1)),
            ]
        );
    }

    #[test]
    fn round_orders_within_phase() {
        let mut queue = Queue::new();
        let node = NodeId(1);
        queue.push(
            Step::Anneal {
                node,
                round: Round::Finite(2),
            },
            Timestamp(1),
        );
        queue.push(
            Step::Anneal {
                node: NodeId(2),
                round: Round::Finite(1),
            },
            Timestamp(9),
        );

        let (first, _) = queue.pop().expect("pop");
        assert_eq!(first.round, Round::Finite(1));
    }

    #[test]
    fn identical_tuples_are_kept_and_ordered_by_insertion() {
        let mut queue = Queue::new();
        let a = queue.push(fire(1), Timestamp(4));
        let b = queue.push(fire(1), Timestamp(4));

        assert_ne!(a, b);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop().map(|(k, _)| k), Some(a));
        assert_eq!(queue.pop().map(|(k, _)| k), Some(b));
    }

    #[test]
    fn remove_drops_only_matching_pair() {
        let mut queue = Queue::new();
        queue.push(fire(1), Timestamp(1));
        queue.push(count(1), Timestamp(2));

        let removed = queue.remove(Element::Node(NodeId(1)), StepKind::Fire);
        assert_eq!(removed, vec![fire(1)]);
        assert_eq!(queue.len(), 1);
        assert!(!queue.contains(Element::Node(NodeId(1)), StepKind::Fire));
        assert!(queue.contains(Element::Node(NodeId(1)), StepKind::Count));

        assert!(
            queue
                .remove(Element::Node(NodeId(1)), StepKind::Fire)
                .is_empty()
        );
    }

    #[test]
    fn pending_by_phase_counts() {
        let mut queue = Queue::new();
        queue.push(fire(1), Timestamp(1));
        queue.push(fire(2), Timestamp(2));
        queue.push(Step::Close { node: NodeId(1) }, Timestamp(3));

        let counts = queue.pending_by_phase();
        assert_eq!(counts.get(&Phase::Inference), Some(&2));
        assert_eq!(counts.get(&Phase::Close), Some(&1));
        assert_eq!(counts.get(&Phase::Anneal), None);
    }
}
