//! # phasegraph-core
//!
//! The deterministic scheduling kernel for Phasegraph.
//!
//! This crate implements an incremental, phase-ordered step scheduler that
//! drives propagation over a directed graph which grows while it is being
//! processed. Steps are produced as a side effect of other steps and run in
//! the order of their [`QueueKey`]: phase, then round, then timestamp.
//!
//! ## Components
//!
//! - `queue` / `step` / `phase`: the scheduling kernel
//! - `graph` / `direction` / `visitor`: the arena and the traversal engine
//! - `linking`: the rule-driven operator with latent-existence deduplication
//! - `context` / `model`: lifecycle and step dispatch
//!
//! ## Architectural Constraints
//!
//! - Deterministic: `BTreeMap` ordering, integer fixed-point, no randomness
//! - No async, no I/O; logging goes through `tracing` only
//! - A context is driven by one worker; contexts share no mutable state

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod context;
pub mod direction;
pub mod graph;
pub mod linking;
pub mod metrics;
pub mod model;
pub mod phase;
pub mod primitives;
pub mod queue;
pub mod step;
pub mod types;
pub mod visitor;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    ContextId, EdgeId, Element, KernelError, NodeId, Relation, Round, Timestamp, VisitId,
};

// =============================================================================
// RE-EXPORTS: Kernel
// =============================================================================

pub use config::KernelConfig;
pub use context::{Context, ContextState, DrainReport};
pub use direction::Direction;
pub use graph::{Edge, Graph, Node};
pub use linking::{LinkRule, LinkingOperator, ScopeMode};
pub use metrics::ContextMetrics;
pub use model::Model;
pub use phase::{PHASE_ORDER, Phase};
pub use queue::{Queue, QueueKey};
pub use step::{Step, StepKind};
pub use visitor::{Operator, TraversalStats, Verdict, Visitor, traverse};
