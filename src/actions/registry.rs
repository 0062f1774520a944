use super::handler::{ActionDef, ActionHandler};
use crate::error::ActionError;

/// Catalog of available actions. Stores definitions, checks arity, looks up
/// handlers by name, and renders the catalog for a prompt.
pub struct ActionRegistry {
    actions: Vec<ActionDef>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Register an action. A later registration under the same name
    /// replaces the earlier one.
    pub fn add(
        mut self,
        name: impl Into<String>,
        arity: usize,
        description: impl Into<String>,
        handler: impl ActionHandler + 'static,
    ) -> Self {
        let name = name.into();
        self.actions.retain(|a| a.name != name);
        self.actions.push(ActionDef {
            name,
            arity,
            description: description.into(),
            handler: Box::new(handler),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Run an action by name with positional arguments.
    ///
    /// The outer `Result` is about dispatch (unknown name, wrong arity); the
    /// inner one is the action's own success or failure.
    pub async fn execute(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<Result<String, String>, ActionError> {
        let action = self
            .get(name)
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))?;
        if args.len() != action.arity {
            return Err(ActionError::Arity {
                name: name.to_string(),
                expected: action.arity,
                got: args.len(),
            });
        }
        Ok(action.handler.call(args).await)
    }

    /// One line per action: `name (N args): description`.
    pub fn describe(&self) -> String {
        self.actions
            .iter()
            .map(|a| format!("{} ({} args): {}", a.name, a.arity, a.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn action_names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
