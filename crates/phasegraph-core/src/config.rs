//! # Kernel Configuration
//!
//! Tunables of a context. Every field has a default, so a partial TOML or
//! JSON table deserializes into a complete configuration.

use crate::KernelError;
use crate::primitives::{
    ANNEAL_SCALE, DEFAULT_ADAPTIVE_DIVISOR, DEFAULT_MIN_ANNEAL_STEP, DEFAULT_TRAVERSAL_DEPTH,
    MAX_TRAVERSAL_DEPTH,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KernelConfig {
    /// Smallest anneal increment, in millionths. Must be in `1..=ANNEAL_SCALE`.
    pub min_anneal_step: u32,
    /// Divisor of the adaptive anneal increment. Must be at least 1.
    pub adaptive_divisor: u32,
    /// Edges followed per descent or ascent.
    pub max_traversal_depth: usize,
    /// Upper bound on steps processed by one drain. `None` is unbounded.
    pub max_drain_steps: Option<usize>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            min_anneal_step: DEFAULT_MIN_ANNEAL_STEP,
            adaptive_divisor: DEFAULT_ADAPTIVE_DIVISOR,
            max_traversal_depth: DEFAULT_TRAVERSAL_DEPTH,
            max_drain_steps: None,
        }
    }
}

impl KernelConfig {
    /// Check every field against its bounds.
    pub fn validate(&self) -> Result<(), KernelError> {
        if self.min_anneal_step == 0 || self.min_anneal_step > ANNEAL_SCALE {
            return Err(KernelError::InvalidConfig(format!(
                "min_anneal_step must be in 1..={}, got {}",
                ANNEAL_SCALE, self.min_anneal_step
            )));
        }
        if self.adaptive_divisor == 0 {
            return Err(KernelError::InvalidConfig(
                "adaptive_divisor must be at least 1".to_string(),
            ));
        }
        if self.max_traversal_depth == 0 || self.max_traversal_depth > MAX_TRAVERSAL_DEPTH {
            return Err(KernelError::InvalidConfig(format!(
                "max_traversal_depth must be in 1..={}, got {}",
                MAX_TRAVERSAL_DEPTH, self.max_traversal_depth
            )));
        }
        if self.max_drain_steps == Some(0) {
            return Err(KernelError::InvalidConfig(
                "max_drain_steps must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Upper bound on anneal rounds needed to reach `ANNEAL_SCALE` from 0.
    #[must_use]
    pub fn anneal_round_bound(&self) -> u32 {
        ANNEAL_SCALE.div_ceil(self.min_anneal_step.max(1))
    }

    /// The increment applied by one anneal round at `value`.
    ///
    /// `max(min_anneal_step, remaining / adaptive_divisor)`, never past the scale.
    #[must_use]
    pub fn anneal_increment(&self, value: u32) -> u32 {
        let remaining = ANNEAL_SCALE.saturating_sub(value);
        let adaptive = remaining / self.adaptive_divisor.max(1);
        adaptive.max(self.min_anneal_step).min(remaining)
    }
}

// =============================================================================
// TESTS
// =============================================================================
