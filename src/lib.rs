pub mod actions;
pub mod context;
pub mod error;
pub mod events;
pub mod inference;
pub mod tokens;
pub mod types;

use tokio::sync::mpsc;
use tracing::info;

pub use actions::{
    builtin, ActionDef, ActionHandler, ActionOutput, ActionPipeline, ActionRegistry, OutputGuard,
};
pub use context::{BoundedContextManager, ContextManager};
pub use error::{ActionError, AgentError, InferenceError, TokenError};
pub use events::AgentEvent;
pub use inference::{InferenceProvider, OpenAiProvider};
pub use tokens::{
    count_text, num_tokens_from_messages, resolve_overhead, Encoding, MessageOverhead,
    TokenCounter, DEFAULT_ACCOUNTING_MODEL,
};
pub use types::{InferenceRequest, InferenceResponse, Message, Role, Usage};

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Model sent to the provider.
    pub model: String,
    /// Model whose token accounting bounds the history. Defaults to
    /// [`DEFAULT_ACCOUNTING_MODEL`].
    pub accounting_model: Option<String>,
    /// Token budget for the whole conversation history.
    pub max_context_len: usize,
    /// Token budget for a single action's output.
    pub max_token_length: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            accounting_model: None,
            max_context_len: 4097,
            max_token_length: 2048,
        }
    }
}

/// Where the agent is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Uninitialized,
    /// `create` has produced a role; no prompt has been answered yet.
    RoleEstablished,
    Active,
}

fn role_request(objective: &str) -> String {
    format!(
        "Briefly define a role for an agent to accomplish the objective: {objective}. \
         Do not repeat any information provided in the objective."
    )
}

fn reminder(role: &str, objective: &str) -> String {
    format!("You are an agent with the role: {role}. Your overarching objective is: {objective}")
}

/// The agent. Wire up a provider, context manager, actions, and go.
///
/// Every model call and action runs to completion before the next step;
/// `&mut self` keeps a single driver in charge of the history.
pub struct Agent {
    provider: Box<dyn InferenceProvider>,
    context: Box<dyn ContextManager>,
    actions: ActionPipeline,
    state: AgentState,
    objective: Option<String>,
    role: Option<String>,
    usage: Usage,
    events: Option<mpsc::Sender<AgentEvent>>,
}

impl Agent {
    pub fn new(
        provider: impl InferenceProvider + 'static,
        context: impl ContextManager + 'static,
        actions: ActionPipeline,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            context: Box::new(context),
            actions,
            state: AgentState::Uninitialized,
            objective: None,
            role: None,
            usage: Usage::default(),
            events: None,
        }
    }

    /// Build the bounded context and guarded action pipeline from `config`.
    pub fn from_config(
        provider: impl InferenceProvider + 'static,
        registry: ActionRegistry,
        config: &AgentConfig,
    ) -> Result<Self, AgentError> {
        let accounting = config
            .accounting_model
            .as_deref()
            .unwrap_or(DEFAULT_ACCOUNTING_MODEL);
        let counter = TokenCounter::for_model(accounting)?;
        let context = BoundedContextManager::new(&config.model, counter, config.max_context_len);
        let actions = ActionPipeline::new(registry, OutputGuard::new(config.max_token_length)?);
        Ok(Self::new(provider, context, actions))
    }

    /// Stream events to `tx` as they happen.
    pub fn with_events(mut self, tx: mpsc::Sender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn objective(&self) -> Option<&str> {
        self.objective.as_deref()
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Token usage reported by the provider, summed over all calls.
    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn context(&self) -> &dyn ContextManager {
        self.context.as_ref()
    }

    pub fn actions(&self) -> &ActionPipeline {
        &self.actions
    }

    /// Ask the model to define a role for `objective` and adopt it.
    /// Returns the role description.
    pub async fn create(&mut self, objective: &str) -> Result<String, AgentError> {
        self.context.add_prompt(&role_request(objective));
        let role = self.infer().await?;

        info!(objective, role = %role, "created new agent");
        self.objective = Some(objective.to_string());
        self.role = Some(role.clone());
        self.state = AgentState::RoleEstablished;

        self.emit(AgentEvent::RoleCreated {
            objective: objective.to_string(),
            role: role.clone(),
        })
        .await;
        Ok(role)
    }

    /// Remind the model of its role and objective, then send `prompt`.
    /// Returns the model's reply.
    pub async fn prompt(&mut self, prompt: &str) -> Result<String, AgentError> {
        let (Some(role), Some(objective)) = (&self.role, &self.objective) else {
            return Err(AgentError::Uninitialized);
        };
        let reminder = reminder(role, objective);

        self.context.add_reminder(&reminder);
        self.context.add_prompt(prompt);
        let reply = self.infer().await?;
        self.state = AgentState::Active;
        Ok(reply)
    }

    /// Run one action through the guarded pipeline without touching the
    /// conversation.
    pub async fn run_action(
        &self,
        name: &str,
        args: &[String],
    ) -> Result<ActionOutput, AgentError> {
        self.emit(AgentEvent::ActionCall {
            name: name.to_string(),
            args: args.to_vec(),
        })
        .await;

        let output = self.actions.execute(name, args).await?;

        self.emit(AgentEvent::ActionResult {
            name: output.name.clone(),
            output: output.text.clone(),
            is_error: output.is_error,
        })
        .await;
        Ok(output)
    }

    /// Run an action and feed its guarded output back as the next prompt.
    ///
    /// [`ActionError::OutputTooLarge`] is returned before anything reaches
    /// the conversation, so the caller can retry with a narrower request.
    pub async fn act(&mut self, name: &str, args: &[String]) -> Result<String, AgentError> {
        if self.state == AgentState::Uninitialized {
            return Err(AgentError::Uninitialized);
        }
        let output = self.run_action(name, args).await?;
        self.prompt(&output.to_string()).await
    }

    async fn infer(&mut self) -> Result<String, AgentError> {
        let request = self.context.build_request();
        let response = self.provider.infer(request).await?;

        self.usage.accumulate(&response.usage);
        self.context.record_response(&response);

        let content = response.message.content;
        self.emit(AgentEvent::Text {
            content: content.clone(),
        })
        .await;
        Ok(content)
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(ref tx) = self.events {
            let _ = tx.send(event).await;
        }
    }
}
