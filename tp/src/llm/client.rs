//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// One call is one HTTP round trip. Retries and model fallback live above
/// this trait so every implementation stays a single attempt.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request to the model named in the request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
