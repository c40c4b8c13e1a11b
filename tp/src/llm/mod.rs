//! LLM client module for the task planner
//!
//! Provides single-attempt completion clients, the request/response types
//! they share, and the retry helper the planner wraps around them.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
mod retry;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use retry::{Backoff, RetryPolicy, invoke_with_retry};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create the LLM client described by the config
///
/// Fails only when the API key is not available.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(OpenAIClient::from_config(config)?))
}
