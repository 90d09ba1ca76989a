//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::error::AppError;
use crate::scenario::{self, RunOptions, RunOutcome, Scenario};
use phasegraph_core::{PHASE_ORDER, Phase, StepKind};
use std::path::Path;

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Load a scenario, drive it and print the outcome.
pub fn cmd_run(
    path: &Path,
    json_mode: bool,
    until: Option<Phase>,
    close: bool,
) -> Result<(), AppError> {
    let scenario = Scenario::load(path)?;
    let options = RunOptions {
        until: until.unwrap_or_else(Phase::last),
        close,
    };
    let outcome = scenario::run(&scenario, options)?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    print_outcome(path, &outcome);
    Ok(())
}

fn print_outcome(path: &Path, outcome: &RunOutcome) {
    let metrics = &outcome.metrics;

    println!("Phasegraph Run");
    println!("==============");
    println!("Scenario: {:?}", path);
    println!("Context:  {} ({:?})", metrics.context, metrics.state);
    println!();

    for (index, drain) in outcome.drains.iter().enumerate() {
        print!(
            "Drain {} (until {}): {} steps",
            index + 1,
            drain.boundary,
            drain.processed
        );
        match drain.stopped_at {
            Some(phase) => println!(", stopped before {}", phase),
            None => println!(", queue empty"),
        }
        for (phase, count) in &drain.by_phase {
            println!("  {:<14} {}", phase.name(), count);
        }
    }
    println!();

    println!("Nodes:        {}", metrics.node_count);
    println!("Edges:        {}", metrics.edge_count);
    println!("Fired:        {}", metrics.fired_count);
    println!("Final:        {}", metrics.final_count);
    println!("Annealed:     {}", metrics.annealed_count);
    println!(
        "Mean anneal:  {} per million",
        metrics.mean_anneal_millionths
    );
    println!("Pending:      {}", metrics.pending_total());
    if !outcome.disconnected {
        println!("Context left connected with pending steps.");
    }
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate a scenario file.
pub fn cmd_check(path: &Path, json_mode: bool) -> Result<(), AppError> {
    let scenario = Scenario::load(path)?;
    let edges: usize = scenario.inputs.iter().map(|i| i.edges.len()).sum();

    if json_mode {
        let output = serde_json::json!({
            "scenario": path.to_string_lossy(),
            "valid": true,
            "inputs": scenario.inputs.len(),
            "edges": edges,
            "rules": scenario.rules.len(),
            "induce": scenario.induce.len(),
            "anneal_round_bound": scenario.kernel.anneal_round_bound(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Scenario {:?} is valid", path);
    println!("  Inputs: {}", scenario.inputs.len());
    println!("  Edges:  {}", edges);
    println!("  Rules:  {}", scenario.rules.len());
    println!("  Induce: {}", scenario.induce.len());
    println!(
        "  Anneal converges within {} rounds",
        scenario.kernel.anneal_round_bound()
    );
    Ok(())
}

// =============================================================================
// PHASES COMMAND
// =============================================================================

/// Print the phase order and the step kinds scheduled in each phase.
pub fn cmd_phases(json_mode: bool) -> Result<(), AppError> {
    let kinds_of = |phase: Phase| -> Vec<&'static str> {
        StepKind::ALL
            .iter()
            .filter(|kind| kind.phase() == phase)
            .map(|kind| kind.name())
            .collect()
    };

    if json_mode {
        let phases: Vec<_> = PHASE_ORDER
            .iter()
            .map(|phase| {
                serde_json::json!({
                    "rank": phase.rank(),
                    "phase": phase.name(),
                    "steps": kinds_of(*phase),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&phases)?);
        return Ok(());
    }

    for phase in PHASE_ORDER {
        println!("{} {:<14} {}", phase.rank(), phase.name(), kinds_of(phase).join(", "));
    }
    Ok(())
}
