use async_trait::async_trait;

/// An action's execution handler. Consumers implement this for each action.
///
/// Operational failures (I/O, network, a failing command) are not errors
/// of the agent: return them as `Err(description)` and the pipeline reports
/// them to the model as a failed result.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn call(&self, args: &[String]) -> Result<String, String>;
}

/// An action definition: what the model is told about it + how to run it.
pub struct ActionDef {
    pub name: String,
    /// Number of positional arguments the action requires.
    pub arity: usize,
    pub description: String,
    pub(crate) handler: Box<dyn ActionHandler>,
}

/// Positional argument `index`, or a failure text the model can read.
pub fn arg(args: &[String], index: usize) -> Result<&str, String> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument {}", index + 1))
}
