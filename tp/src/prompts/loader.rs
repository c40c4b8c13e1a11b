//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;

/// Template rendered for every planning request
const TASK_BREAKDOWN_TEMPLATE: &str = "task-breakdown";

/// Variables available to the task-breakdown template
#[derive(Debug, Clone, Serialize)]
pub struct TaskBreakdownContext {
    /// The goal, with any caller context already folded in
    pub goal: String,
    /// Deadline as given by the caller, normally `YYYY-MM-DD`
    pub deadline: String,
}

/// Fold optional free-text context into the goal
///
/// Blank context leaves the goal untouched.
pub fn compose_goal(goal: &str, context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{goal}\n\nContext: {context}"),
        None => goal.to_string(),
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.taskplanner/prompts/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader rooted at `root`
    ///
    /// Looks for `.taskplanner/prompts/` and `prompts/` under the root; missing
    /// directories are skipped.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let user_dir = root.join(".taskplanner/prompts");
        let repo_dir = root.join("prompts");

        let user_dir_exists = user_dir.is_dir();
        let repo_dir_exists = repo_dir.is_dir();
        debug!(
            ?user_dir,
            %user_dir_exists,
            ?repo_dir,
            %repo_dir_exists,
            "PromptLoader::new: checking directories"
        );

        Self {
            hbs: Self::engine(),
            user_dir: user_dir_exists.then_some(user_dir),
            repo_dir: repo_dir_exists.then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    // Goals are free text headed for a model, not HTML
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.taskplanner/prompts/{name}.pmt`
    /// 2. Repo default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "load_template: using file template");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "load_template: using embedded template");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Build the task-breakdown instruction for a goal and deadline
    pub fn task_breakdown(&self, goal: &str, deadline: &str) -> Result<String> {
        debug!(goal_len = goal.len(), %deadline, "task_breakdown: called");
        let context = TaskBreakdownContext {
            goal: goal.to_string(),
            deadline: deadline.to_string(),
        };
        self.render(TASK_BREAKDOWN_TEMPLATE, &context)
    }
}
