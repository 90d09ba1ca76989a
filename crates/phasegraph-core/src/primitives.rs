//! # Innate Primitives
//!
//! Hardcoded runtime constants for the kernel.
//!
//! These values are compiled into the binary. Everything tunable lives in
//! [`crate::config::KernelConfig`] and is bounded by the limits below.

/// Fixed-point scale of the anneal value.
///
/// A node's anneal value ranges over `0..=ANNEAL_SCALE`; `ANNEAL_SCALE`
/// represents 1.0. Integer millionths keep the kernel free of floats.
pub const ANNEAL_SCALE: u32 = 1_000_000;

/// Default minimum increment applied by one anneal round (0.1).
///
/// Together with `ANNEAL_SCALE` this bounds an anneal fixed point to
/// `ceil(ANNEAL_SCALE / min_step)` rounds.
pub const DEFAULT_MIN_ANNEAL_STEP: u32 = 100_000;

/// Default divisor of the adaptive anneal step.
///
/// One round raises the value by `max(min_step, remaining / divisor)`.
pub const DEFAULT_ADAPTIVE_DIVISOR: u32 = 2;

/// Default depth limit for a single visitor descent or ascent.
pub const DEFAULT_TRAVERSAL_DEPTH: usize = 8;

/// Hard upper bound for traversal depth.
///
/// - All traversals must be computationally bounded.
/// - Configured depths above this are rejected.
pub const MAX_TRAVERSAL_DEPTH: usize = 64;

/// Relation used by structural induction to tie an instance to its template.
pub const INSTANCE_RELATION: &str = "instance";

/// Maximum length of a node label or relation name.
pub const MAX_LABEL_LENGTH: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_anneal_step_fits_scale() {
        assert!(DEFAULT_MIN_ANNEAL_STEP > 0);
        assert!(DEFAULT_MIN_ANNEAL_STEP <= ANNEAL_SCALE);
    }

    #[test]
    fn default_depth_within_bound() {
        assert!(DEFAULT_TRAVERSAL_DEPTH <= MAX_TRAVERSAL_DEPTH);
    }
}
