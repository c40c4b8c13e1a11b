//! Plan - the structured result of one planning request

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::task::Task;

/// Why fallback content was substituted for model output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The completion text could not be parsed as a plan document
    MalformedResponse,
    /// The document parsed but carried no usable `tasks` list
    MissingTasks,
    /// Every model failed every attempt
    ModelUnavailable,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedResponse => write!(f, "model response could not be parsed"),
            Self::MissingTasks => write!(f, "model response contained no usable tasks"),
            Self::ModelUnavailable => write!(f, "model service unavailable"),
        }
    }
}

/// Where a plan's content came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum PlanSource {
    /// Parsed from the named model's completion
    Model { model: String },
    /// Tasks (and possibly everything else) synthesized locally
    Fallback { reason: FallbackReason },
}

/// The top-level result of a planning request
///
/// `tasks` is never empty once a plan leaves the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub tasks: Vec<Task>,

    /// Task names, in order, that determine the schedule
    #[serde(default)]
    pub critical_path: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_total_time: Option<String>,

    #[serde(default)]
    pub risk_factors: Vec<String>,

    #[serde(default)]
    pub recommendations: Vec<String>,

    pub source: PlanSource,
}

impl Plan {
    /// True when any part of this plan was substituted by the fallback generator
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PlanSource::Fallback { .. })
    }

    /// The fallback reason, if any
    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self.source {
            PlanSource::Fallback { reason } => Some(reason),
            PlanSource::Model { .. } => None,
        }
    }

    /// Data-quality warnings for names that point at no task in this plan
    pub fn dangling_references(&self) -> Vec<String> {
        let names: HashSet<&str> = self.tasks.iter().map(|t| t.name.as_str()).collect();
        let mut warnings = Vec::new();

        for task in &self.tasks {
            for dep in &task.dependencies {
                if !names.contains(dep.as_str()) {
                    warnings.push(format!("Task '{}' depends on unknown task '{}'", task.name, dep));
                }
            }
        }
        for name in &self.critical_path {
            if !names.contains(name.as_str()) {
                warnings.push(format!("Critical path references unknown task '{}'", name));
            }
        }

        warnings
    }
}
