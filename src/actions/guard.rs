use tiktoken_rs::CoreBPE;

use crate::error::{ActionError, TokenError};
use crate::tokens::Encoding;

/// Rejects action output that would cost more than `max_token_length`
/// tokens under the model-independent encoding.
///
/// Output is either returned whole or refused; it is never cut down.
#[derive(Clone)]
pub struct OutputGuard {
    max_token_length: usize,
    bpe: &'static CoreBPE,
}

impl OutputGuard {
    pub fn new(max_token_length: usize) -> Result<Self, TokenError> {
        Ok(Self {
            max_token_length,
            bpe: Encoding::FALLBACK.bpe()?,
        })
    }

    pub fn max_token_length(&self) -> usize {
        self.max_token_length
    }

    pub fn check(&self, output: String) -> Result<String, ActionError> {
        let tokens = self.bpe.encode_ordinary(&output).len();
        if tokens > self.max_token_length {
            return Err(ActionError::OutputTooLarge {
                tokens,
                max: self.max_token_length,
            });
        }
        Ok(output)
    }
}

impl std::fmt::Debug for OutputGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputGuard")
            .field("max_token_length", &self.max_token_length)
            .finish_non_exhaustive()
    }
}
