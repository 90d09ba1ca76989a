//! # Context
//!
//! A processing context owns one queue, one graph arena and the clocks that
//! order them. It drains steps in key order and dispatches each by pattern
//! matching on the step variant.
//!
//! ## Lifecycle
//!
//! `Open → Closed → Disconnected`
//! - `Open`: accepts inputs, induction requests, rules and external links
//! - `Closed`: steps still run and may create nodes; external input is refused
//! - `Disconnected`: the queue was empty at disconnect; nothing is accepted
//!
//! ## Concurrency
//!
//! A context is driven by one logical worker. All counters are local, so
//! independent contexts can be processed on separate threads.

use crate::config::KernelConfig;
use crate::direction::Direction;
use crate::graph::Graph;
use crate::linking::{LinkRule, LinkingOperator};
use crate::phase::Phase;
use crate::primitives::{ANNEAL_SCALE, INSTANCE_RELATION, MAX_LABEL_LENGTH};
use crate::queue::{Queue, QueueKey};
use crate::step::{Step, StepKind};
use crate::visitor::{self, Operator, TraversalStats, Visitor};
use crate::{ContextId, EdgeId, Element, KernelError, NodeId, Relation, Round, Timestamp, VisitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

/// Lifecycle state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Open,
    Closed,
    Disconnected,
}

/// Summary of one drain call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// The phase bound of the drain.
    pub boundary: Phase,
    /// Steps processed.
    pub processed: usize,
    /// Steps processed per phase.
    pub by_phase: BTreeMap<Phase, usize>,
    /// Key of the last processed step.
    pub last_key: Option<QueueKey>,
    /// Phase of the first step left pending because it ranks after the bound.
    pub stopped_at: Option<Phase>,
}

impl DrainReport {
    fn new(boundary: Phase) -> Self {
        Self {
            boundary,
            processed: 0,
            by_phase: BTreeMap::new(),
            last_key: None,
            stopped_at: None,
        }
    }

    fn record(&mut self, key: QueueKey) {
        self.processed = self.processed.saturating_add(1);
        let count = self.by_phase.entry(key.phase).or_insert(0);
        *count = count.saturating_add(1);
        self.last_key = Some(key);
    }
}

/// A processing context ("thought").
#[derive(Debug, Clone)]
pub struct Context {
    id: ContextId,
    state: ContextState,
    config: KernelConfig,
    rules: Vec<LinkRule>,
    graph: Graph,
    queue: Queue,
    clock: u64,
    next_visit: u64,
}

impl Context {
    /// Create an open context with the default configuration and no rules.
    #[must_use]
    pub fn new(id: ContextId) -> Self {
        Self {
            id,
            state: ContextState::Open,
            config: KernelConfig::default(),
            rules: Vec::new(),
            graph: Graph::new(),
            queue: Queue::new(),
            clock: 0,
            next_visit: 0,
        }
    }

    /// Create an open context with a validated configuration and rule set.
    pub fn with_config(
        id: ContextId,
        config: KernelConfig,
        rules: Vec<LinkRule>,
    ) -> Result<Self, KernelError> {
        config.validate()?;
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self {
            config,
            rules,
            ..Self::new(id)
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Whether the context still accepts external input.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ContextState::Open
    }

    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    #[must_use]
    pub fn rules(&self) -> &[LinkRule] {
        &self.rules
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    // =========================================================================
    // CLOCKS
    // =========================================================================

    /// Next timestamp. Strictly increasing.
    pub fn new_timestamp(&mut self) -> Timestamp {
        let ts = Timestamp(self.clock);
        self.clock = self.clock.saturating_add(1);
        ts
    }

    /// Next traversal pass identifier.
    pub fn new_visit_id(&mut self) -> VisitId {
        self.next_visit = self.next_visit.saturating_add(1);
        VisitId(self.next_visit)
    }

    // =========================================================================
    // EXTERNAL INPUT
    // =========================================================================

    /// Add a rule applied by every subsequent link step.
    pub fn register_rule(&mut self, rule: LinkRule) -> Result<(), KernelError> {
        self.require_open()?;
        rule.validate()?;
        self.rules.push(rule);
        Ok(())
    }

    /// Add a structural node. It is counted but not fired.
    pub fn add_node(&mut self, label: impl Into<String>) -> Result<NodeId, KernelError> {
        self.require_open()?;
        let label = label.into();
        validate_label(&label)?;
        self.create_node(label, None)
    }

    /// Add an input node. It is counted and fired.
    pub fn add_input(&mut self, label: impl Into<String>) -> Result<NodeId, KernelError> {
        let node = self.add_node(label)?;
        self.add_step(Step::Fire { node })?;
        Ok(node)
    }

    /// Create `source -relation-> target` unless it already exists.
    ///
    /// Returns the new edge, or `None` if the triple was already present.
    /// A new edge gets a propagate step.
    pub fn link(
        &mut self,
        source: NodeId,
        target: NodeId,
        relation: Relation,
    ) -> Result<Option<EdgeId>, KernelError> {
        self.require_open()?;
        validate_label(relation.as_str())?;
        if self.graph.link_exists(source, target, &relation) {
            return Ok(None);
        }
        self.create_edge(source, target, relation).map(Some)
    }

    /// Request structural induction for `node`.
    ///
    /// Returns `false` if an instantiate step is already pending for it.
    pub fn induce(&mut self, node: NodeId) -> Result<bool, KernelError> {
        self.require_open()?;
        self.add_step(Step::Instantiate { node })
    }

    /// Run one traversal pass from `start` with a caller-supplied operator.
    pub fn traverse<O: Operator + ?Sized>(
        &mut self,
        start: NodeId,
        op: &mut O,
    ) -> Result<TraversalStats, KernelError> {
        let visit = self.new_visit_id();
        let visitor = Visitor::start(visit, start, self.config.max_traversal_depth);
        visitor::traverse(&mut self.graph, op, visitor)
    }

    // =========================================================================
    // SCHEDULING
    // =========================================================================

    /// Enqueue a step, setting its element's pending flag.
    ///
    /// # Errors
    /// - `InvariantViolation` if a step of the same kind is already pending for the element
    /// - `NodeNotFound` / `EdgeNotFound` if the element is missing
    /// - `ContextClosed` once disconnected
    pub fn enqueue(&mut self, step: Step) -> Result<QueueKey, KernelError> {
        if self.state == ContextState::Disconnected {
            return Err(KernelError::ContextClosed(self.id));
        }
        let (element, kind) = (step.element(), step.kind());
        if !self.graph.mark_pending(element, kind)? {
            return Err(KernelError::invariant(format!(
                "{} step already queued for {}",
                kind, element
            )));
        }
        let ts = self.new_timestamp();
        let key = self.queue.push(step, ts);
        trace!(context = %self.id, %key, %element, %kind, "step enqueued");
        Ok(key)
    }

    /// Enqueue a step unless one of its kind is already pending for its element.
    ///
    /// Returns whether the step was enqueued.
    pub fn add_step(&mut self, step: Step) -> Result<bool, KernelError> {
        if self.graph.is_pending(step.element(), step.kind())? {
            return Ok(false);
        }
        self.enqueue(step)?;
        Ok(true)
    }

    /// Remove the pending step of `kind` for `element`.
    ///
    /// Returns `false` if none was pending (e.g. it already ran).
    pub fn cancel(&mut self, element: Element, kind: StepKind) -> Result<bool, KernelError> {
        let removed = self.queue.remove(element, kind);
        if removed.is_empty() {
            return Ok(false);
        }
        self.graph.clear_pending(element, kind)?;
        debug!(context = %self.id, %element, %kind, "step cancelled");
        Ok(true)
    }

    /// Process steps in key order through phase `boundary`.
    ///
    /// Stops when the queue is empty or the next step ranks after
    /// `boundary`; such steps stay pending. A processing error aborts the
    /// drain and leaves the remaining steps queued.
    pub fn drain_until(&mut self, boundary: Phase) -> Result<DrainReport, KernelError> {
        let mut report = DrainReport::new(boundary);

        loop {
            match self.queue.peek_phase() {
                None => break,
                Some(phase) if phase > boundary => {
                    report.stopped_at = Some(phase);
                    break;
                }
                Some(_) => {}
            }

            if let Some(limit) = self.config.max_drain_steps {
                if report.processed >= limit {
                    warn!(context = %self.id, limit, "drain step limit reached");
                    return Err(KernelError::invariant(format!(
                        "drain exceeded {} steps with {} still pending",
                        limit,
                        self.queue.len()
                    )));
                }
            }

            let Some((key, step)) = self.queue.pop() else {
                break;
            };
            debug!(context = %self.id, %key, %step, "processing step");
            if let Err(e) = self.process(step) {
                warn!(context = %self.id, %key, error = %e, "step failed, drain aborted");
                return Err(e);
            }
            report.record(key);
        }

        info!(
            context = %self.id,
            boundary = %boundary,
            processed = report.processed,
            pending = self.queue.len(),
            "drain finished"
        );
        Ok(report)
    }

    /// Process every pending step.
    pub fn drain(&mut self) -> Result<DrainReport, KernelError> {
        self.drain_until(Phase::last())
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Stop accepting external input and schedule a close step for every node.
    ///
    /// Nodes created by steps after this point get their close step on creation.
    pub fn close(&mut self) -> Result<(), KernelError> {
        match self.state {
            ContextState::Open => {}
            ContextState::Closed => return Ok(()),
            ContextState::Disconnected => return Err(KernelError::ContextClosed(self.id)),
        }
        self.state = ContextState::Closed;
        let nodes: Vec<NodeId> = self.graph.nodes().map(|n| n.id).collect();
        for node in nodes {
            self.add_step(Step::Close { node })?;
        }
        info!(context = %self.id, nodes = self.graph.node_count(), "context closed");
        Ok(())
    }

    /// Retire the context. The queue must be empty.
    pub fn disconnect(&mut self) -> Result<(), KernelError> {
        if !self.queue.is_empty() {
            return Err(KernelError::invariant(format!(
                "{} cannot disconnect with {} pending steps",
                self.id,
                self.queue.len()
            )));
        }
        self.state = ContextState::Disconnected;
        info!(context = %self.id, "context disconnected");
        Ok(())
    }

    // =========================================================================
    // STEP DISPATCH
    // =========================================================================

    fn process(&mut self, step: Step) -> Result<(), KernelError> {
        self.graph.clear_pending(step.element(), step.kind())?;

        match step {
            Step::Count { node } => {
                let node = self.graph.node_mut(node)?;
                node.frequency = node.frequency.saturating_add(1);
                Ok(())
            }
            Step::Fire { node } => self.fire(node),
            Step::Propagate { edge } => self.propagate(edge),
            Step::Link { node } => self.link_from(node),
            Step::Instantiate { node } => self.instantiate(node),
            Step::Anneal { node, round } => self.anneal(node, round),
            Step::Close { node } => {
                self.graph.node_mut(node)?.is_final = true;
                Ok(())
            }
        }
    }

    fn fire(&mut self, node: NodeId) -> Result<(), KernelError> {
        let ts = self.new_timestamp();
        self.graph.set_fired(node, ts)?;

        self.add_step(Step::Link { node })?;
        self.add_step(Step::Anneal {
            node,
            round: Round::ZERO,
        })?;
        let outputs = Direction::Output.neighbors(&self.graph, node)?.to_vec();
        for edge in outputs {
            self.add_step(Step::Propagate { edge })?;
        }
        Ok(())
    }

    fn propagate(&mut self, edge: EdgeId) -> Result<(), KernelError> {
        let (source, target) = {
            let edge = self.graph.edge(edge)?;
            (edge.source, edge.target)
        };
        if self.graph.node(source)?.has_fired() && !self.graph.node(target)?.has_fired() {
            self.add_step(Step::Fire { node: target })?;
        }
        Ok(())
    }

    fn link_from(&mut self, node: NodeId) -> Result<(), KernelError> {
        for index in 0..self.rules.len() {
            let visit = self.new_visit_id();
            let visitor = Visitor::start(visit, node, self.config.max_traversal_depth);

            let mut op = LinkingOperator::new(&self.rules[index]);
            let stats = visitor::traverse(&mut self.graph, &mut op, visitor)?;
            let requests = op.into_requests();

            debug!(
                context = %self.id,
                rule = %self.rules[index].name,
                %node,
                visited = stats.visited,
                requests = requests.len(),
                "link pass"
            );

            for (start, candidate) in requests {
                self.bind(index, start, candidate)?;
            }
        }
        Ok(())
    }

    /// Materialize a binding requested under rule `index`.
    ///
    /// Returns the new binding node, or `None` if the latent existence check
    /// found one already.
    fn bind(
        &mut self,
        index: usize,
        start: NodeId,
        candidate: NodeId,
    ) -> Result<Option<NodeId>, KernelError> {
        let rule = self.rules.get(index).cloned().ok_or_else(|| {
            KernelError::invariant(format!("link rule #{} is not registered", index))
        })?;

        if let Some(existing) = rule.existing_binding(&self.graph, start, candidate) {
            trace!(context = %self.id, rule = %rule.name, %start, %candidate, %existing, "binding exists");
            return Ok(None);
        }

        let label = rule.binding_label(&self.graph, start, candidate);
        let origin = self.graph.node(start)?.origin;
        let binding = self.create_node(label, Some(origin))?;
        self.create_edge(start, binding, rule.first.clone())?;
        self.create_edge(candidate, binding, rule.second.clone())?;

        debug!(context = %self.id, rule = %rule.name, %start, %candidate, %binding, "binding created");
        Ok(Some(binding))
    }

    fn instantiate(&mut self, node: NodeId) -> Result<(), KernelError> {
        let relation = Relation::new(INSTANCE_RELATION);
        let (label, origin, existing) = {
            let template = self.graph.node(node)?;
            let existing = template
                .edges(Direction::Output)
                .iter()
                .filter_map(|id| self.graph.edge(*id).ok())
                .find(|edge| edge.relation == relation)
                .map(|edge| edge.target);
            (format!("{}'", template.label), template.origin, existing)
        };

        if let Some(instance) = existing {
            trace!(context = %self.id, %node, %instance, "instance exists");
            return Ok(());
        }

        let instance = self.create_node(label, Some(origin))?;
        self.create_edge(node, instance, relation)?;
        debug!(context = %self.id, template = %node, %instance, "instance created");
        Ok(())
    }

    fn anneal(&mut self, node: NodeId, round: Round) -> Result<(), KernelError> {
        let increment = {
            let current = self.graph.node(node)?.anneal;
            self.config.anneal_increment(current)
        };
        let value = {
            let n = self.graph.node_mut(node)?;
            n.anneal = n.anneal.saturating_add(increment).min(ANNEAL_SCALE);
            n.anneal
        };

        if value < ANNEAL_SCALE {
            self.add_step(Step::Anneal {
                node,
                round: round.next(),
            })?;
        } else {
            trace!(context = %self.id, %node, %round, "anneal converged");
        }
        Ok(())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn require_open(&self) -> Result<(), KernelError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(KernelError::ContextClosed(self.id))
        }
    }

    /// Allocate a node and schedule its bookkeeping steps.
    fn create_node(&mut self, label: String, origin: Option<NodeId>) -> Result<NodeId, KernelError> {
        let ts = self.new_timestamp();
        let node = self.graph.add_node(label, origin, ts);
        self.add_step(Step::Count { node })?;
        if self.state == ContextState::Closed {
            self.add_step(Step::Close { node })?;
        }
        Ok(node)
    }

    /// Allocate an edge and schedule its propagate step.
    fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        relation: Relation,
    ) -> Result<EdgeId, KernelError> {
        let ts = self.new_timestamp();
        let edge = self.graph.add_edge(source, target, relation, ts)?;
        self.add_step(Step::Propagate { edge })?;
        Ok(edge)
    }
}

fn validate_label(label: &str) -> Result<(), KernelError> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return Err(KernelError::invariant(format!(
            "labels must be 1..={} bytes, got {}",
            MAX_LABEL_LENGTH,
            label.len()
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_rule() -> LinkRule {
        LinkRule::new(
            "pair",
            Relation::new("feeds"),
            Relation::new("feeds"),
            Relation::new("left"),
            Relation::new("right"),
        )
    }

    /// p feeds x and y; x is an input, y is structural.
    fn sibling_context() -> (Context, NodeId, NodeId, NodeId) {
        let mut ctx = Context::with_config(ContextId(1), KernelConfig::default(), vec![pair_rule()])
            .expect("context");
        let p = ctx.add_node("p").expect("p");
        let y = ctx.add_node("y").expect("y");
        let x = ctx.add_input("x").expect("x");
        ctx.link(p, x, Relation::new("feeds")).expect("link");
        ctx.link(p, y, Relation::new("feeds")).expect("link");
        (ctx, p, x, y)
    }

    #[test]
    fn timestamps_strictly_increase() {
        let mut ctx = Context::new(ContextId(0));
        let a = ctx.new_timestamp();
        let b = ctx.new_timestamp();
        assert!(a < b);
        assert!(ctx.new_visit_id() < ctx.new_visit_id());
    }

    #[test]
    fn add_step_twice_enqueues_once() {
        let mut ctx = Context::new(ContextId(0));
        let node = ctx.add_node("a").expect("node");
        let before = ctx.queue().len();

        assert!(ctx.add_step(Step::Fire { node }).expect("add"));
        assert!(!ctx.add_step(Step::Fire { node }).expect("add"));
        assert_eq!(ctx.queue().len(), before + 1);
    }

    #[test]
    fn direct_duplicate_enqueue_is_invariant_violation() {
        let mut ctx = Context::new(ContextId(0));
        let node = ctx.add_node("a").expect("node");
        ctx.enqueue(Step::Link { node }).expect("first");
        assert!(matches!(
            ctx.enqueue(Step::Link { node }),
            Err(KernelError::InvariantViolation(_))
        ));
    }

    #[test]
    fn flag_clears_when_step_runs() {
        let mut ctx = Context::new(ContextId(0));
        let node = ctx.add_node("a").expect("node");
        ctx.drain().expect("drain");
        assert_eq!(ctx.graph().node(node).expect("node").frequency, 1);

        // Count is no longer pending, so a new one is accepted.
        assert!(ctx.add_step(Step::Count { node }).expect("add"));
        ctx.drain().expect("drain");
        assert_eq!(ctx.graph().node(node).expect("node").frequency, 2);
    }

    #[test]
    fn cancel_removes_pending_step() {
        let mut ctx = Context::new(ContextId(0));
        let node = ctx.add_input("a").expect("input");

        assert!(ctx.cancel(Element::Node(node), StepKind::Fire).expect("cancel"));
        assert!(!ctx.cancel(Element::Node(node), StepKind::Fire).expect("cancel"));

        ctx.drain().expect("drain");
        assert!(!ctx.graph().node(node).expect("node").has_fired());
        // The flag was cleared, so the element can be scheduled again.
        assert!(ctx.add_step(Step::Fire { node }).expect("add"));
    }

    #[test]
    fn drain_until_leaves_later_phases_pending() {
        let (mut ctx, _, x, _) = sibling_context();

        let report = ctx.drain_until(Phase::Inference).expect("drain");
        assert!(report.by_phase.keys().all(|p| *p <= Phase::Inference));
        assert_eq!(report.stopped_at, Some(Phase::Linking));
        assert!(ctx.graph().node(x).expect("x").has_fired());
        assert!(ctx.queue().iter().all(|(k, _)| k.phase > Phase::Inference));
        assert!(ctx.queue().contains(Element::Node(x), StepKind::Link));
    }

    #[test]
    fn link_step_materializes_binding() {
        let (mut ctx, _, x, y) = sibling_context();
        ctx.drain().expect("drain");

        let rule = pair_rule();
        let binding = rule.existing_binding(ctx.graph(), x, y).expect("binding");
        let node = ctx.graph().node(binding).expect("binding node");
        assert_eq!(node.label, "pair(x,y)");
        assert_eq!(node.origin, x);
        // The binding fired through its edge from x and was counted once.
        assert!(node.has_fired());
        assert_eq!(node.frequency, 1);
    }

    #[test]
    fn relinking_the_same_pass_adds_nothing() {
        let (mut ctx, _, x, _) = sibling_context();
        ctx.drain().expect("drain");
        let edges = ctx.graph().edge_count();
        let nodes = ctx.graph().node_count();

        ctx.enqueue(Step::Link { node: x }).expect("enqueue");
        ctx.drain().expect("drain");

        assert_eq!(ctx.graph().edge_count(), edges);
        assert_eq!(ctx.graph().node_count(), nodes);
    }

    #[test]
    fn external_link_is_idempotent() {
        let mut ctx = Context::new(ContextId(0));
        let a = ctx.add_node("a").expect("a");
        let b = ctx.add_node("b").expect("b");
        assert!(ctx.link(a, b, Relation::new("r")).expect("link").is_some());
        assert!(ctx.link(a, b, Relation::new("r")).expect("link").is_none());
        assert_eq!(ctx.graph().edge_count(), 1);
    }

    #[test]
    fn anneal_converges_within_bound() {
        let mut ctx = Context::new(ContextId(0));
        let node = ctx.add_input("a").expect("input");
        let report = ctx.drain().expect("drain");

        let anneal_steps = report.by_phase.get(&Phase::Anneal).copied().unwrap_or(0);
        assert!(anneal_steps >= 1);
        assert!(anneal_steps <= ctx.config().anneal_round_bound() as usize);
        assert_eq!(ctx.graph().node(node).expect("node").anneal, ANNEAL_SCALE);
        assert!(!ctx.queue().contains(Element::Node(node), StepKind::Anneal));
    }

    #[test]
    fn instantiate_creates_single_instance() {
        let mut ctx = Context::new(ContextId(0));
        let node = ctx.add_node("cat").expect("node");
        assert!(ctx.induce(node).expect("induce"));
        assert!(!ctx.induce(node).expect("induce"));
        ctx.drain().expect("drain");
        assert_eq!(ctx.graph().node_count(), 2);

        ctx.induce(node).expect("induce");
        ctx.drain().expect("drain");
        assert_eq!(ctx.graph().node_count(), 2);

        let instance = ctx
            .graph()
            .nodes()
            .find(|n| n.id != node)
            .expect("instance");
        assert_eq!(instance.label, "cat'");
    }

    #[test]
    fn close_finalizes_every_node_last() {
        let (mut ctx, _, _, _) = sibling_context();
        ctx.close().expect("close");
        assert!(!ctx.is_open());
        assert!(matches!(
            ctx.add_input("late"),
            Err(KernelError::ContextClosed(_))
        ));

        let report = ctx.drain().expect("drain");
        assert_eq!(report.last_key.map(|k| k.phase), Some(Phase::Close));
        assert!(ctx.graph().nodes().all(|n| n.is_final));
        assert!(ctx.queue().is_empty());
    }

    #[test]
    fn disconnect_requires_empty_queue() {
        let mut ctx = Context::new(ContextId(3));
        ctx.add_input("a").expect("input");
        assert!(matches!(
            ctx.disconnect(),
            Err(KernelError::InvariantViolation(_))
        ));
        ctx.drain().expect("drain");
        ctx.disconnect().expect("disconnect");
        assert_eq!(ctx.state(), ContextState::Disconnected);
        assert!(matches!(ctx.close(), Err(KernelError::ContextClosed(_))));
    }

    #[test]
    fn failing_step_aborts_drain_and_keeps_rest() {
        let mut ctx = Context::new(ContextId(0));
        let node = ctx.add_node("a").expect("node");
        ctx.enqueue(Step::Fire { node }).expect("fire");
        ctx.drain_until(Phase::Inference).expect("drain");

        // A second fire of the same node breaks the fired-once rule.
        ctx.enqueue(Step::Fire { node }).expect("refire");
        let err = ctx.drain();
        assert!(matches!(err, Err(KernelError::InvariantViolation(_))));

        // The link and anneal steps scheduled by the first fire are untouched.
        assert!(ctx.queue().contains(Element::Node(node), StepKind::Link));
        assert!(ctx.queue().contains(Element::Node(node), StepKind::Anneal));
    }

    #[test]
    fn drain_step_limit_is_enforced() {
        let config = KernelConfig {
            max_drain_steps: Some(1),
            ..KernelConfig::default()
        };
        let mut ctx = Context::with_config(ContextId(0), config, Vec::new()).expect("context");
        ctx.add_input("a").expect("input");
        assert!(matches!(
            ctx.drain(),
            Err(KernelError::InvariantViolation(_))
        ));
        assert!(!ctx.queue().is_empty());
    }
}
