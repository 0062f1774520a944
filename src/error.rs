use crate::tokens::Encoding;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),
    #[error("token accounting error: {0}")]
    Token(#[from] TokenError),
    #[error("action error: {0}")]
    Action(#[from] ActionError),
    #[error("agent has no role yet, call create() first")]
    Uninitialized,
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token counting is not implemented for model {0}")]
    UnsupportedModel(String),
    #[error("failed to load encoding {encoding}: {reason}")]
    LoadEncoding { encoding: Encoding, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("action {name} takes {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("output token length ({tokens}) exceeds the maximum allowed ({max})")]
    OutputTooLarge { tokens: usize, max: usize },
}
