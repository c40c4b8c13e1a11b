//! Smart Task Planner - goals in, dependency-aware task plans out
//!
//! A goal and a deadline are turned into a prompt, sent to an
//! OpenAI-compatible model (primary, then backup, each with retries), and the
//! free-form answer is normalized into a [`Plan`]. Model output is untrusted:
//! anything unusable is replaced by a deterministic fallback schedule, so a
//! plan with at least one task always comes back.
//!
//! # Modules
//!
//! - [`domain`] - `Plan`, `Task` and their enums
//! - [`prompts`] - prompt templates and loading
//! - [`llm`] - LLM client trait, OpenAI-compatible client, retry policy
//! - [`planning`] - normalizer, fallback generator and `TaskPlanner`
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface
//! - [`render`] - text output for the CLI

pub mod cli;
pub mod config;
pub mod domain;
pub mod llm;
pub mod planning;
pub mod prompts;
pub mod render;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use domain::{FallbackReason, Plan, PlanSource, Priority, Task};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, RetryPolicy, create_client};
pub use planning::{Clock, PlannerSettings, SystemClock, TaskPlanner};
pub use prompts::PromptLoader;
