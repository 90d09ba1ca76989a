//! # Scenarios
//!
//! A scenario is a TOML file describing one context run:
//!
//! ```toml
//! [kernel]
//! min_anneal_step = 200000
//!
//! [[rule]]
//! name = "pair"
//! down = "feeds"
//! up = "feeds"
//! first = "left"
//! second = "right"
//!
//! [[input]]
//! label = "p"
//! fire = false
//! edges = [{ target = "x", relation = "feeds" }, { target = "y", relation = "feeds" }]
//!
//! [[input]]
//! label = "x"
//!
//! [[induce]]
//! label = "y"
//! ```
//!
//! Nodes are created in declaration order, then edges, then induction
//! requests. Edge targets and induction labels may name any declared node.

use crate::error::AppError;
use phasegraph_core::{
    Context, ContextMetrics, DrainReport, KernelConfig, LinkRule, Model, NodeId, Phase, Relation,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Maximum scenario file size (16 MB).
pub const MAX_SCENARIO_FILE_SIZE: u64 = 16 * 1024 * 1024;

// =============================================================================
// SCHEMA
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub kernel: KernelConfig,
    #[serde(default, rename = "rule")]
    pub rules: Vec<LinkRule>,
    #[serde(default, rename = "input")]
    pub inputs: Vec<InputDecl>,
    #[serde(default, rename = "induce")]
    pub induce: Vec<InduceDecl>,
}

/// A node declaration. Fired unless `fire = false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDecl {
    pub label: String,
    #[serde(default = "default_fire")]
    pub fire: bool,
    #[serde(default)]
    pub edges: Vec<EdgeDecl>,
}

/// An output edge of the declaring node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDecl {
    pub target: String,
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InduceDecl {
    pub label: String,
}

fn default_fire() -> bool {
    true
}

// =============================================================================
// LOADING
// =============================================================================

impl Scenario {
    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let io_err = |source| AppError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = std::fs::metadata(path).map_err(io_err)?;
        if metadata.len() > MAX_SCENARIO_FILE_SIZE {
            return Err(AppError::Scenario(format!(
                "file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_SCENARIO_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(io_err)?;
        let scenario = Self::parse(&text)?;
        debug!(
            path = %path.display(),
            inputs = scenario.inputs.len(),
            rules = scenario.rules.len(),
            "scenario loaded"
        );
        Ok(scenario)
    }

    /// Parse and validate scenario text.
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let scenario: Scenario = toml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check kernel bounds, rule fields, label uniqueness and references.
    pub fn validate(&self) -> Result<(), AppError> {
        self.kernel.validate()?;
        for rule in &self.rules {
            rule.validate()?;
        }

        let mut labels = BTreeMap::new();
        for (index, input) in self.inputs.iter().enumerate() {
            if let Some(previous) = labels.insert(input.label.as_str(), index) {
                return Err(AppError::Scenario(format!(
                    "label '{}' declared twice (inputs #{} and #{})",
                    input.label, previous, index
                )));
            }
        }

        for input in &self.inputs {
            for edge in &input.edges {
                if !labels.contains_key(edge.target.as_str()) {
                    return Err(AppError::Scenario(format!(
                        "edge from '{}' targets undeclared label '{}'",
                        input.label, edge.target
                    )));
                }
            }
        }
        for request in &self.induce {
            if !labels.contains_key(request.label.as_str()) {
                return Err(AppError::Scenario(format!(
                    "induce names undeclared label '{}'",
                    request.label
                )));
            }
        }
        Ok(())
    }

    /// A model carrying this scenario's kernel config and rules.
    pub fn model(&self) -> Result<Model, AppError> {
        Model::with_config(self.kernel.clone(), self.rules.clone()).map_err(AppError::from)
    }

    /// Create this scenario's nodes, edges and induction requests in `ctx`.
    ///
    /// Returns the node id of every declared label.
    pub fn populate(&self, ctx: &mut Context) -> Result<BTreeMap<String, NodeId>, AppError> {
        let mut ids = BTreeMap::new();
        for input in &self.inputs {
            let id = if input.fire {
                ctx.add_input(input.label.clone())?
            } else {
                ctx.add_node(input.label.clone())?
            };
            ids.insert(input.label.clone(), id);
        }

        for input in &self.inputs {
            let source = lookup(&ids, &input.label)?;
            for edge in &input.edges {
                let target = lookup(&ids, &edge.target)?;
                ctx.link(source, target, Relation::new(edge.relation.clone()))?;
            }
        }

        for request in &self.induce {
            ctx.induce(lookup(&ids, &request.label)?)?;
        }

        Ok(ids)
    }
}

fn lookup(ids: &BTreeMap<String, NodeId>, label: &str) -> Result<NodeId, AppError> {
    ids.get(label)
        .copied()
        .ok_or_else(|| AppError::Scenario(format!("undeclared label '{}'", label)))
}

// =============================================================================
// RUNNING
// =============================================================================

/// How far to drive a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Phase bound of the first drain.
    pub until: Phase,
    /// Close the context after the first drain and drain again.
    pub close: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            until: Phase::last(),
            close: false,
        }
    }
}

/// Result of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub labels: BTreeMap<String, NodeId>,
    pub drains: Vec<DrainReport>,
    pub metrics: ContextMetrics,
    /// Whether the context was disconnected from its model at the end.
    pub disconnected: bool,
}

/// Open a context for `scenario`, populate it and drain it.
///
/// The context is disconnected when its queue ends up empty; a bounded run
/// that leaves steps pending stays connected and says so in the outcome.
pub fn run(scenario: &Scenario, options: RunOptions) -> Result<RunOutcome, AppError> {
    let mut model = scenario.model()?;
    let mut ctx = model.open_context()?;
    let labels = scenario.populate(&mut ctx)?;

    let mut drains = vec![ctx.drain_until(options.until)?];
    if options.close {
        ctx.close()?;
        drains.push(ctx.drain()?);
    }

    let disconnected = ctx.queue().is_empty();
    if disconnected {
        model.disconnect(&mut ctx)?;
    }
    let metrics = ContextMetrics::from_context(&ctx);

    info!(
        context = %ctx.id(),
        nodes = metrics.node_count,
        edges = metrics.edge_count,
        pending = metrics.pending_total(),
        "scenario finished"
    );

    Ok(RunOutcome {
        labels,
        drains,
        metrics,
        disconnected,
    })
}

// =============================================================================
// TESTS
// =============================================================================
