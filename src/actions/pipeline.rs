use std::fmt;

use tracing::{debug, warn};

use super::guard::OutputGuard;
use super::registry::ActionRegistry;
use crate::error::ActionError;

/// Guarded result of one action run.
///
/// `is_error` marks outputs that describe a failure of the action itself,
/// so callers never have to sniff the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutput {
    pub name: String,
    pub text: String,
    pub is_error: bool,
}

impl fmt::Display for ActionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_error { "failed" } else { "succeeded" };
        write!(f, "Action {} {status}:\n{}", self.name, self.text)
    }
}

/// Executes actions and routes every result through the output guard.
pub struct ActionPipeline {
    registry: ActionRegistry,
    guard: OutputGuard,
}

impl ActionPipeline {
    pub fn new(registry: ActionRegistry, guard: OutputGuard) -> Self {
        Self { registry, guard }
    }

    /// Execute an action by name and guard its output.
    ///
    /// Successful and failed runs both go through the guard. An oversized
    /// output yields [`ActionError::OutputTooLarge`] and is discarded.
    pub async fn execute(&self, name: &str, args: &[String]) -> Result<ActionOutput, ActionError> {
        let (raw, is_error) = match self.registry.execute(name, args).await? {
            Ok(text) => (text, false),
            Err(text) => (text, true),
        };

        let text = match self.guard.check(raw) {
            Ok(text) => text,
            Err(e) => {
                warn!(action = name, error = %e, "action output rejected");
                return Err(e);
            }
        };

        debug!(action = name, is_error, output = %text, "action output");
        Ok(ActionOutput {
            name: name.to_string(),
            text,
            is_error,
        })
    }

    pub fn guard(&self) -> &OutputGuard {
        &self.guard
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }
}
