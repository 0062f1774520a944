//! Token accounting for chat messages and free text.
//!
//! Chat models charge a fixed overhead per message (and per `name` field) on
//! top of the encoded length of every field. The constants differ between
//! model generations, so the rule is resolved from the model identifier once
//! and then reused for every count.

use std::fmt;
use std::sync::OnceLock;

use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer};
use tiktoken_rs::CoreBPE;
use tracing::warn;

use crate::error::TokenError;
use crate::types::Message;

/// Model assumed when the caller doesn't name one for accounting.
pub const DEFAULT_ACCOUNTING_MODEL: &str = "gpt-3.5-turbo-0613";

/// Every reply is primed with `<|start|>assistant<|message|>`.
const REPLY_PRIMING_TOKENS: i64 = 3;

const CURRENT_CHAT_MODELS: &[&str] = &[
    "gpt-3.5-turbo-0613",
    "gpt-3.5-turbo-16k-0613",
    "gpt-4-0314",
    "gpt-4-32k-0314",
    "gpt-4-0613",
    "gpt-4-32k-0613",
];

const LEGACY_CHAT_MODEL: &str = "gpt-3.5-turbo-0301";

/// Family substring -> latest variant with known constants.
const MODEL_FAMILIES: &[(&str, &str)] = &[
    ("gpt-3.5-turbo", "gpt-3.5-turbo-0613"),
    ("gpt-4", "gpt-4-0613"),
];

/// Encodings available locally.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Encoding {
    Cl100kBase,
    O200kBase,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cl100kBase => f.write_str("cl100k_base"),
            Self::O200kBase => f.write_str("o200k_base"),
        }
    }
}

static CL100K: OnceLock<CoreBPE> = OnceLock::new();
static O200K: OnceLock<CoreBPE> = OnceLock::new();

impl Encoding {
    /// Model-independent encoding, used for anything that isn't a chat message.
    pub const FALLBACK: Encoding = Encoding::Cl100kBase;

    /// Encoding used by `model`. Unknown models get [`Encoding::FALLBACK`].
    pub fn for_model(model: &str) -> Self {
        match get_tokenizer(model) {
            Some(Tokenizer::Cl100kBase) => Self::Cl100kBase,
            Some(Tokenizer::O200kBase) => Self::O200kBase,
            _ => {
                warn!(model, encoding = %Self::FALLBACK, "model not found, using fallback encoding");
                Self::FALLBACK
            }
        }
    }

    /// Loaded BPE tables, cached for the life of the process.
    pub fn bpe(self) -> Result<&'static CoreBPE, TokenError> {
        let cell: &'static OnceLock<CoreBPE> = match self {
            Self::Cl100kBase => &CL100K,
            Self::O200kBase => &O200K,
        };
        if let Some(bpe) = cell.get() {
            return Ok(bpe);
        }
        let loader: fn() -> anyhow::Result<CoreBPE> = match self {
            Self::Cl100kBase => tiktoken_rs::cl100k_base,
            Self::O200kBase => tiktoken_rs::o200k_base,
        };
        let bpe = loader().map_err(|e| TokenError::LoadEncoding {
            encoding: self,
            reason: e.to_string(),
        })?;
        Ok(cell.get_or_init(|| bpe))
    }
}

/// Encoded length of `text` under the fallback encoding.
pub fn count_text(text: &str) -> Result<usize, TokenError> {
    Ok(Encoding::FALLBACK.bpe()?.encode_ordinary(text).len())
}

/// Per-message overhead charged by a chat model generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageOverhead {
    pub tokens_per_message: i64,
    pub tokens_per_name: i64,
}

impl MessageOverhead {
    /// `<|start|>{role/name}\n{content}<|end|>\n` framing.
    pub const CURRENT: MessageOverhead = MessageOverhead {
        tokens_per_message: 3,
        tokens_per_name: 1,
    };

    /// A name replaces the role token.
    pub const LEGACY: MessageOverhead = MessageOverhead {
        tokens_per_message: 4,
        tokens_per_name: -1,
    };
}

/// Resolve the accounting rule for `model`, returning it together with the
/// exact model variant whose constants were used.
///
/// Identifiers that only contain a known family name resolve to that
/// family's latest known variant, with a warning that the count is an
/// approximation.
pub fn resolve_overhead(model: &str) -> Result<(MessageOverhead, &'static str), TokenError> {
    if let Some(&known) = CURRENT_CHAT_MODELS.iter().find(|m| **m == model) {
        return Ok((MessageOverhead::CURRENT, known));
    }
    if model == LEGACY_CHAT_MODEL {
        return Ok((MessageOverhead::LEGACY, LEGACY_CHAT_MODEL));
    }
    for &(family, latest) in MODEL_FAMILIES {
        if model.contains(family) {
            warn!(
                model,
                assumed = latest,
                "{family} may update over time, token count is approximate"
            );
            return resolve_overhead(latest);
        }
    }
    Err(TokenError::UnsupportedModel(model.to_string()))
}

/// Counts the tokens a chat model consumes for a message sequence.
///
/// Built once per model; counting itself can't fail.
#[derive(Clone)]
pub struct TokenCounter {
    model: String,
    overhead: MessageOverhead,
    bpe: &'static CoreBPE,
}

impl TokenCounter {
    pub fn for_model(model: &str) -> Result<Self, TokenError> {
        let (overhead, resolved) = resolve_overhead(model)?;
        let bpe = Encoding::for_model(resolved).bpe()?;
        Ok(Self {
            model: resolved.to_string(),
            overhead,
            bpe,
        })
    }

    /// The model variant whose constants this counter applies.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn overhead(&self) -> MessageOverhead {
        self.overhead
    }

    fn encoded_len(&self, text: &str) -> i64 {
        self.bpe.encode_ordinary(text).len() as i64
    }

    pub fn count(&self, messages: &[Message]) -> usize {
        self.count_iter(messages.iter())
    }

    pub fn count_iter<'a>(&self, messages: impl Iterator<Item = &'a Message>) -> usize {
        let mut total = REPLY_PRIMING_TOKENS;
        for message in messages {
            total += self.overhead.tokens_per_message;
            total += self.encoded_len(message.role.as_str());
            total += self.encoded_len(&message.content);
            if let Some(ref name) = message.name {
                total += self.encoded_len(name);
                total += self.overhead.tokens_per_name;
            }
        }
        // Per-name credits never exceed the role token they replace.
        debug_assert!(total >= 0, "negative token total {total}");
        usize::try_from(total).unwrap_or(0)
    }
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("model", &self.model)
            .field("overhead", &self.overhead)
            .finish_non_exhaustive()
    }
}

/// One-shot form of [`TokenCounter::count`].
pub fn num_tokens_from_messages(messages: &[Message], model: &str) -> Result<usize, TokenError> {
    Ok(TokenCounter::for_model(model)?.count(messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_models_use_current_overhead() {
        for model in CURRENT_CHAT_MODELS {
            let (overhead, resolved) = resolve_overhead(model).unwrap();
            assert_eq!(overhead, MessageOverhead::CURRENT);
            assert_eq!(resolved, *model);
        }
    }

    #[test]
    fn legacy_model_uses_legacy_overhead() {
        let (overhead, _) = resolve_overhead("gpt-3.5-turbo-0301").unwrap();
        assert_eq!(overhead.tokens_per_message, 4);
        assert_eq!(overhead.tokens_per_name, -1);
    }

    #[test]
    fn family_names_resolve_to_latest_variant() {
        let (overhead, resolved) = resolve_overhead("gpt-3.5-turbo").unwrap();
        assert_eq!(overhead, MessageOverhead::CURRENT);
        assert_eq!(resolved, "gpt-3.5-turbo-0613");

        let (_, resolved) = resolve_overhead("gpt-4-turbo-preview").unwrap();
        assert_eq!(resolved, "gpt-4-0613");
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = resolve_overhead("claude-3-opus").unwrap_err();
        assert!(matches!(err, TokenError::UnsupportedModel(ref m) if m == "claude-3-opus"));
        assert!(TokenCounter::for_model("llama3").is_err());
    }

    #[test]
    fn count_text_uses_cl100k() {
        assert_eq!(count_text("hello world").unwrap(), 2);
        assert_eq!(count_text("").unwrap(), 0);
    }

    #[test]
    fn empty_sequence_costs_reply_priming() {
        let counter = TokenCounter::for_model(DEFAULT_ACCOUNTING_MODEL).unwrap();
        assert_eq!(counter.count(&[]), 3);
    }

    #[test]
    fn message_cost_includes_overhead_and_fields() {
        let counter = TokenCounter::for_model(DEFAULT_ACCOUNTING_MODEL).unwrap();
        let role = count_text("user").unwrap();
        let content = count_text("hello world").unwrap();
        let cost = counter.count(&[Message::user("hello world")]);
        assert_eq!(cost, 3 + role + content + 3);
    }

    #[test]
    fn name_field_adds_per_name_tokens() {
        let current = TokenCounter::for_model("gpt-4-0613").unwrap();
        let legacy = TokenCounter::for_model("gpt-3.5-turbo-0301").unwrap();
        let plain = [Message::user("hello world")];
        let named = [Message::user("hello world").with_name("alice")];
        let name_len = count_text("alice").unwrap();

        assert_eq!(current.count(&named), current.count(&plain) + name_len + 1);
        assert_eq!(legacy.count(&named), legacy.count(&plain) + name_len - 1);
        // Legacy framing costs one more per message.
        assert_eq!(legacy.count(&plain), current.count(&plain) + 1);
    }

    #[test]
    fn counting_is_idempotent() {
        let messages = vec![
            Message::system("You are terse."),
            Message::user("What is the capital of France?"),
            Message::assistant("Paris."),
        ];
        let first = num_tokens_from_messages(&messages, "gpt-3.5-turbo").unwrap();
        let second = num_tokens_from_messages(&messages, "gpt-3.5-turbo").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn family_fallback_matches_latest_variant_count() {
        let messages = vec![Message::user("count me")];
        assert_eq!(
            num_tokens_from_messages(&messages, "gpt-4").unwrap(),
            num_tokens_from_messages(&messages, "gpt-4-0613").unwrap()
        );
    }

    #[test]
    fn unknown_model_gets_fallback_encoding() {
        assert_eq!(Encoding::for_model("totally-unknown-model"), Encoding::FALLBACK);
        assert_eq!(Encoding::FALLBACK, Encoding::Cl100kBase);
    }

    #[test]
    fn known_models_get_their_encoding() {
        assert_eq!(Encoding::for_model("gpt-4o"), Encoding::O200kBase);
        assert_eq!(Encoding::for_model("gpt-4-0613"), Encoding::Cl100kBase);
    }
}
