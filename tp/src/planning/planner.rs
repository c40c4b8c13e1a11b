//! TaskPlanner - goal in, validated plan out
//!
//! Builds the task-breakdown prompt, asks the primary model (then the backup
//! model) with retries, and normalizes whatever comes back.

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use super::fallback::{Clock, fallback_plan};
use super::normalize::normalize;
use crate::domain::{FallbackReason, Plan};
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Message, RetryPolicy, invoke_with_retry};
use crate::prompts::PromptLoader;

/// Default system instruction sent ahead of every prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful project planning assistant.";

/// Model selection, sampling and retry settings for the planner
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    pub primary_model: String,
    /// Tried with the same retry policy once the primary is exhausted
    pub backup_model: Option<String>,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub retry: RetryPolicy,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            primary_model: "openai/gpt-oss-120b".to_string(),
            backup_model: Some("meta-llama/Llama-3.1-8B-Instruct".to_string()),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 3000,
            temperature: 0.3,
            top_p: 0.9,
            retry: RetryPolicy::default(),
        }
    }
}

impl PlannerSettings {
    /// Models in the order they are tried
    pub fn models(&self) -> Vec<&str> {
        std::iter::once(self.primary_model.as_str())
            .chain(self.backup_model.as_deref())
            .collect()
    }
}

/// Turns goals into plans
pub struct TaskPlanner {
    llm: Arc<dyn LlmClient>,
    settings: PlannerSettings,
    prompts: PromptLoader,
    clock: Arc<dyn Clock>,
}

impl TaskPlanner {
    pub fn new(llm: Arc<dyn LlmClient>, settings: PlannerSettings, prompts: PromptLoader, clock: Arc<dyn Clock>) -> Self {
        debug!(primary = %settings.primary_model, backup = ?settings.backup_model, "TaskPlanner::new: called");
        Self {
            llm,
            settings,
            prompts,
            clock,
        }
    }

    /// Generate a plan for `goal`, due by `deadline` (`YYYY-MM-DD`)
    ///
    /// Model failures and unusable output never surface as errors; they
    /// produce a fallback plan instead. Only a prompt that cannot be
    /// rendered is an error.
    pub async fn generate_plan(&self, goal: &str, deadline: &str) -> Result<Plan> {
        info!(%deadline, "Generating plan");
        let prompt = self
            .prompts
            .task_breakdown(goal, deadline)
            .context("Failed to build task breakdown prompt")?;

        let request = CompletionRequest {
            model: self.settings.primary_model.clone(),
            messages: vec![Message::system(&self.settings.system_prompt), Message::user(prompt)],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
        };

        let plan = match self.invoke(&request).await {
            Ok((model, response)) => normalize(response.content_text(), &model, goal, deadline, self.clock.as_ref()),
            Err(e) => {
                warn!(error = %e, "All models failed, using fallback plan");
                fallback_plan(goal, deadline, self.clock.as_ref(), FallbackReason::ModelUnavailable)
            }
        };

        for warning in plan.dangling_references() {
            warn!("{}", warning);
        }
        info!(
            tasks = plan.tasks.len(),
            fallback = ?plan.fallback_reason(),
            "Plan generated"
        );
        Ok(plan)
    }

    /// Try each configured model in order, each with the retry policy
    ///
    /// Returns the model that answered with its response, or the last error.
    async fn invoke(&self, request: &CompletionRequest) -> Result<(String, CompletionResponse), LlmError> {
        let mut last_error = None;

        for model in self.settings.models() {
            let attempt_request = request.for_model(model);
            let result = invoke_with_retry(&self.settings.retry, model, |attempt| {
                debug!(%model, attempt, "invoke: sending request");
                self.llm.complete(attempt_request.clone())
            })
            .await;

            match result {
                Ok(response) => return Ok((model.to_string(), response)),
                Err(e) => {
                    warn!(%model, error = %e, "Model failed after retries");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("no models configured".to_string())))
    }
}
