//! # Context Metrics
//!
//! Read-only snapshot of a context, for reporting.
//!
//! Ratios are stored as fixed-point millionths (integer only).

use crate::context::{Context, ContextState};
use crate::phase::{PHASE_ORDER, Phase};
use crate::primitives::ANNEAL_SCALE;
use crate::ContextId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetrics {
    pub context: ContextId,
    pub state: ContextState,
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes with a fired timestamp.
    pub fired_count: usize,
    /// Nodes marked final by a close step.
    pub final_count: usize,
    /// Nodes whose anneal value reached the scale.
    pub annealed_count: usize,
    /// Mean anneal value over all nodes, in millionths.
    pub mean_anneal_millionths: u64,
    /// Pending steps per phase. Every phase is present, possibly with zero.
    pub pending: BTreeMap<Phase, usize>,
}

impl ContextMetrics {
    /// Compute metrics from a context.
    #[must_use]
    pub fn from_context(context: &Context) -> Self {
        let graph = context.graph();

        let mut fired_count = 0;
        let mut final_count = 0;
        let mut annealed_count = 0;
        let mut anneal_total: u64 = 0;
        for node in graph.nodes() {
            if node.has_fired() {
                fired_count += 1;
            }
            if node.is_final {
                final_count += 1;
            }
            if node.anneal >= ANNEAL_SCALE {
                annealed_count += 1;
            }
            anneal_total = anneal_total.saturating_add(u64::from(node.anneal));
        }

        let node_count = graph.node_count();
        let mean_anneal_millionths = if node_count > 0 {
            anneal_total / (node_count as u64)
        } else {
            0
        };

        let mut pending: BTreeMap<Phase, usize> = PHASE_ORDER.iter().map(|p| (*p, 0)).collect();
        pending.extend(context.queue().pending_by_phase());

        Self {
            context: context.id(),
            state: context.state(),
            node_count,
            edge_count: graph.edge_count(),
            fired_count,
            final_count,
            annealed_count,
            mean_anneal_millionths,
            pending,
        }
    }

    /// Total pending steps.
    #[must_use]
    pub fn pending_total(&self) -> usize {
        self.pending.values().sum()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context() {
        let ctx = Context::new(ContextId(0));
        let metrics = ContextMetrics::from_context(&ctx);
        assert_eq!(metrics.node_count, 0);
        assert_eq!(metrics.mean_anneal_millionths, 0);
        assert_eq!(metrics.pending.len(), PHASE_ORDER.len());
        assert_eq!(metrics.pending_total(), 0);
    }

    #[test]
    fn counts_follow_processing() {
        let mut ctx = Context::new(ContextId(0));
        ctx.add_input("a").expect("input");
        ctx.add_node("b").expect("node");

        let before = ContextMetrics::from_context(&ctx);
        assert_eq!(before.pending.get(&Phase::Counting), Some(&2));
        assert_eq!(before.pending.get(&Phase::Inference), Some(&1));
        assert_eq!(before.fired_count, 0);

        ctx.drain().expect("drain");
        let after = ContextMetrics::from_context(&ctx);
        assert_eq!(after.fired_count, 1);
        assert_eq!(after.annealed_count, 1);
        assert_eq!(after.mean_anneal_millionths, u64::from(ANNEAL_SCALE) / 2);
        assert_eq!(after.pending_total(), 0);
    }
}
