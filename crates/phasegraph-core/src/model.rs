//! # Model
//!
//! Hands out processing contexts one at a time.
//!
//! The model owns the shared configuration and rule set. Only one context may
//! be connected at once: opening a second context before the first has been
//! disconnected fails with `NotYetConnectable` and leaves the model untouched.

use crate::config::KernelConfig;
use crate::context::Context;
use crate::linking::LinkRule;
use crate::{ContextId, KernelError};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Model {
    config: KernelConfig,
    rules: Vec<LinkRule>,
    next_context_id: u64,
    connected: Option<ContextId>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            config: KernelConfig::default(),
            rules: Vec::new(),
            next_context_id: 0,
            connected: None,
        }
    }
}

impl Model {
    /// A model with the default configuration and no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A model with a validated configuration and rule set.
    pub fn with_config(config: KernelConfig, rules: Vec<LinkRule>) -> Result<Self, KernelError> {
        config.validate()?;
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self {
            config,
            rules,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// The currently connected context, if any.
    #[must_use]
    pub fn connected(&self) -> Option<ContextId> {
        self.connected
    }

    /// Open a new context seeded with the model's configuration and rules.
    ///
    /// # Errors
    /// `NotYetConnectable` while a previous context is still connected.
    pub fn open_context(&mut self) -> Result<Context, KernelError> {
        if let Some(previous) = self.connected {
            return Err(KernelError::NotYetConnectable(previous));
        }

        let id = ContextId(self.next_context_id);
        let context = Context::with_config(id, self.config.clone(), self.rules.clone())?;
        self.next_context_id = self.next_context_id.saturating_add(1);
        self.connected = Some(id);

        info!(context = %id, rules = self.rules.len(), "context opened");
        Ok(context)
    }

    /// Disconnect `context`, freeing the model for the next one.
    ///
    /// # Errors
    /// - `InvariantViolation` if steps are still pending
    /// - `ContextClosed` if `context` is not the connected one
    pub fn disconnect(&mut self, context: &mut Context) -> Result<(), KernelError> {
        if self.connected != Some(context.id()) {
            return Err(KernelError::ContextClosed(context.id()));
        }
        context.disconnect()?;
        self.connected = None;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_context_waits_for_disconnect() {
        let mut model = Model::new();
        let mut first = model.open_context().expect("first");
        assert_eq!(model.connected(), Some(first.id()));

        assert!(matches!(
            model.open_context(),
            Err(KernelError::NotYetConnectable(id)) if id == first.id()
        ));

        model.disconnect(&mut first).expect("disconnect");
        let second = model.open_context().expect("second");
        assert!(second.id() > first.id());
    }

    #[test]
    fn disconnect_with_pending_steps_fails() {
        let mut model = Model::new();
        let mut ctx = model.open_context().expect("open");
        ctx.add_input("a").expect("input");

        assert!(matches!(
            model.disconnect(&mut ctx),
            Err(KernelError::InvariantViolation(_))
        ));
        // Still connected, so no new context yet.
        assert!(model.open_context().is_err());

        ctx.drain().expect("drain");
        model.disconnect(&mut ctx).expect("disconnect");
        assert_eq!(model.connected(), None);
    }

    #[test]
    fn foreign_context_is_rejected() {
        let mut model = Model::new();
        let _ctx = model.open_context().expect("open");
        let mut stranger = Context::new(ContextId(42));
        assert!(matches!(
            model.disconnect(&mut stranger),
            Err(KernelError::ContextClosed(_))
        ));
    }

    #[test]
    fn contexts_inherit_rules_and_config() {
        let config = KernelConfig {
            max_traversal_depth: 3,
            ..KernelConfig::default()
        };
        let rule = LinkRule::new(
            "pair",
            crate::Relation::new("a"),
            crate::Relation::new("a"),
            crate::Relation::new("l"),
            crate::Relation::new("r"),
        );
        let mut model = Model::with_config(config.clone(), vec![rule]).expect("model");
        let ctx = model.open_context().expect("open");
        assert_eq!(ctx.config(), &config);
        assert_eq!(ctx.rules().len(), 1);
    }
}
