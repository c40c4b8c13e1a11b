//! LLM request/response types
//!
//! These model the OpenAI-style chat completions API: a list of role-tagged
//! messages in, one text completion out.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier to route the request to
    pub model: String,

    /// System instruction followed by the user prompt
    pub messages: Vec<Message>,

    /// Max tokens for the response
    pub max_tokens: u32,

    /// Sampling temperature (low favors determinism)
    pub temperature: f64,

    /// Nucleus-sampling cutoff
    pub top_p: f64,
}

impl CompletionRequest {
    /// Copy of this request routed to a different model
    pub fn for_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        debug!("Message::system: called");
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        debug!("Message::assistant: called");
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Response from an LLM completion
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Text content, if the model produced any
    pub content: Option<String>,

    /// Why the model stopped generating
    pub stop_reason: StopReason,

    /// Token usage for this request
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Response carrying only text (used by tests and scripted clients)
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Trimmed completion text, empty when the model returned none
    pub fn content_text(&self) -> &str {
        self.content.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Reason the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// Natural end of response
    #[default]
    EndTurn,
    /// Hit max_tokens limit; the JSON is likely truncated
    MaxTokens,
}

/// Token usage for a request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
