//! Provider trait — the abstraction over the upstream chat-completion service.
//!
//! The orchestrator translates a conversation into an [`UpstreamRequest`]
//! and hands it to a `Provider`, which owns the wire format and the network
//! call. Implementations: the OpenAI-compatible HTTP provider, and scripted
//! providers in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExchangeError;

/// Role of a turn as the upstream sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamRole {
    System,
    User,
    Assistant,
}

impl UpstreamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl From<crate::message::Role> for UpstreamRole {
    fn from(role: crate::message::Role) -> Self {
        match role {
            crate::message::Role::User => Self::User,
            crate::message::Role::Assistant => Self::Assistant,
        }
    }
}

/// One block of a multi-part turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentPart {
    Text(String),
    /// A data URI
    Image(String),
}

/// The payload of one upstream turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpstreamContent {
    /// A plain text turn
    Text(String),
    /// Mixed text and image blocks
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: UpstreamRole,
    pub content: UpstreamContent,
}

impl UpstreamMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: UpstreamRole::System,
            content: UpstreamContent::Text(text.into()),
        }
    }
}

/// A fully-built request for one exchange. Never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    /// The model identifier (e.g., "openai/gpt-4o-mini")
    pub model: String,

    /// System turn followed by the translated history
    pub messages: Vec<UpstreamMessage>,

    /// Sampling temperature
    pub temperature: f64,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl UpstreamRequest {
    /// Text of the leading system turn, if any.
    pub fn system_prompt(&self) -> Option<&str> {
        match self.messages.first() {
            Some(UpstreamMessage {
                role: UpstreamRole::System,
                content: UpstreamContent::Text(text),
            }) => Some(text),
            _ => None,
        }
    }
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// The assistant's reply, unmodified
    pub text: String,

    /// Token accounting, passed through as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,

    /// Which model actually responded, when the upstream says so
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// The outcome of one exchange.
pub type ExchangeResult = std::result::Result<Completion, ExchangeError>;

/// The core Provider trait.
///
/// One call to `complete()` is exactly one upstream attempt: no retries, and
/// no state carried from one call to the next.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: UpstreamRequest) -> ExchangeResult;
}
