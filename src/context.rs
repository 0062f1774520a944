use std::collections::VecDeque;

use tracing::debug;

use crate::tokens::TokenCounter;
use crate::types::{InferenceRequest, InferenceResponse, Message};

/// Owns everything the LLM sees. The ONE place all context decisions happen.
pub trait ContextManager: Send + Sync {
    /// Build the complete inference request for the next turn.
    fn build_request(&self) -> InferenceRequest;

    /// Record a user message.
    fn add_prompt(&mut self, prompt: &str);

    /// Record a system reminder.
    fn add_reminder(&mut self, reminder: &str);

    /// Record what the model said.
    fn record_response(&mut self, response: &InferenceResponse);

    /// Current cost of the whole history, in tokens.
    fn token_count(&self) -> usize;

    /// Number of messages currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// FIFO message history kept under a token budget.
///
/// Every append is followed by front eviction: the oldest message is dropped
/// until the history costs at most `max_context_len` tokens. The last
/// remaining message is never dropped, even when it alone is over budget.
#[derive(Debug, Clone)]
pub struct BoundedContextManager {
    model: String,
    counter: TokenCounter,
    max_context_len: usize,
    messages: VecDeque<Message>,
    evicted: usize,
}

impl BoundedContextManager {
    /// `model` is what gets sent to the provider; `counter` decides what
    /// the history costs.
    pub fn new(model: impl Into<String>, counter: TokenCounter, max_context_len: usize) -> Self {
        Self {
            model: model.into(),
            counter,
            max_context_len,
            messages: VecDeque::new(),
            evicted: 0,
        }
    }

    pub fn max_context_len(&self) -> usize {
        self.max_context_len
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    /// Messages in conversation order, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Total number of messages evicted over this context's lifetime.
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Append a message, then evict down to budget.
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        self.evict();
    }

    /// Drop the oldest messages until the history fits the budget or only
    /// one message is left. Returns how many were removed.
    pub fn evict(&mut self) -> usize {
        let mut removed = 0;
        let mut tokens = self.token_count();
        while tokens > self.max_context_len && self.messages.len() > 1 {
            self.messages.pop_front();
            removed += 1;
            tokens = self.token_count();
        }

        if removed > 0 {
            self.evicted += removed;
            debug!(
                removed,
                remaining = self.messages.len(),
                tokens,
                budget = self.max_context_len,
                "evicted oldest messages"
            );
        }
        removed
    }
}

impl ContextManager for BoundedContextManager {
    fn build_request(&self) -> InferenceRequest {
        InferenceRequest {
            model: self.model.clone(),
            messages: self.messages.iter().cloned().collect(),
        }
    }

    fn add_prompt(&mut self, prompt: &str) {
        self.push(Message::user(prompt));
    }

    fn add_reminder(&mut self, reminder: &str) {
        self.push(Message::system(reminder));
    }

    fn record_response(&mut self, response: &InferenceResponse) {
        self.push(response.message.clone());
    }

    fn token_count(&self) -> usize {
        self.counter.count_iter(self.messages.iter())
    }

    fn len(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::DEFAULT_ACCOUNTING_MODEL;
    use crate::types::{Role, Usage};

    fn counter() -> TokenCounter {
        TokenCounter::for_model(DEFAULT_ACCOUNTING_MODEL).unwrap()
    }

    /// A user message that costs exactly `tokens` when counted on its own.
    /// Each " word" chunk encodes to a single token.
    fn user_message_costing(label: &str, tokens: usize) -> Message {
        let counter = counter();
        let mut message = Message::user(label);
        while counter.count(std::slice::from_ref(&message)) < tokens {
            message.content.push_str(" word");
        }
        assert_eq!(counter.count(std::slice::from_ref(&message)), tokens);
        message
    }

    #[test]
    fn under_budget_keeps_everything() {
        let mut ctx = BoundedContextManager::new("gpt-3.5-turbo", counter(), 4097);
        ctx.add_prompt("hello");
        ctx.add_reminder("be brief");
        ctx.record_response(&InferenceResponse {
            message: Message::assistant("hi"),
            usage: Usage::default(),
        });

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.evicted(), 0);
        let roles: Vec<Role> = ctx.messages().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::System, Role::Assistant]);
    }

    #[test]
    fn thirty_token_messages_under_fifty_budget() {
        let mut ctx = BoundedContextManager::new("gpt-3.5-turbo", counter(), 50);
        let first = user_message_costing("first", 30);
        let second = user_message_costing("second", 30);
        let third = user_message_costing("third", 30);

        ctx.push(first.clone());
        ctx.push(second);
        ctx.push(third.clone());

        assert!(ctx.token_count() <= 50);
        assert!(ctx.messages().all(|m| *m != first));
        assert_eq!(ctx.last(), Some(&third));
    }

    #[test]
    fn budget_holds_after_every_append() {
        let budget = 60;
        let mut ctx = BoundedContextManager::new("gpt-3.5-turbo", counter(), budget);
        for i in 0..20 {
            ctx.add_prompt(&format!("message number {i} with a little padding text"));
            assert!(ctx.token_count() <= budget || ctx.len() == 1);
        }
        assert!(ctx.evicted() > 0);
    }

    #[test]
    fn eviction_removes_oldest_and_keeps_order() {
        let mut ctx = BoundedContextManager::new("gpt-3.5-turbo", counter(), 80);
        let pushed: Vec<String> = (0..15).map(|i| format!("entry {i}")).collect();
        for text in &pushed {
            ctx.add_prompt(text);
        }

        let survivors: Vec<String> = ctx.messages().map(|m| m.content.clone()).collect();
        assert!(survivors.len() < pushed.len());
        // Survivors are exactly the newest suffix, in insertion order.
        assert_eq!(survivors, pushed[pushed.len() - survivors.len()..].to_vec());
    }

    #[test]
    fn single_oversized_message_is_kept() {
        let mut ctx = BoundedContextManager::new("gpt-3.5-turbo", counter(), 10);
        ctx.add_prompt("short");
        ctx.add_prompt(&"lots of words ".repeat(50));

        assert_eq!(ctx.len(), 1);
        assert!(ctx.token_count() > 10);
        assert!(ctx.last().unwrap().content.starts_with("lots of words"));
    }

    #[test]
    fn build_request_uses_inference_model() {
        let mut ctx = BoundedContextManager::new("gpt-3.5-turbo", counter(), 4097);
        ctx.add_prompt("hi");
        let req = ctx.build_request();
        assert_eq!(req.model, "gpt-3.5-turbo");
        assert_eq!(req.messages, vec![Message::user("hi")]);
    }
}
