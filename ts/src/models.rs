//! Record types stored in and returned by the store

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a stored task
///
/// Tasks are always saved as `Pending`; only `Store::update_task_status`
/// changes them afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    /// All statuses in display order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Blocked,
    ];

    /// Column value used in the `tasks.status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "blocked" => Ok(Self::Blocked),
            _ => Err(format!(
                "Unknown task status: {}. Use: pending, in_progress, completed, or blocked",
                s
            )),
        }
    }
}

/// Status of a stored project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown project status: {}. Use: active or completed", s)),
        }
    }
}

/// A project row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: i64,
    pub goal: String,
    pub deadline: String,
    /// RFC 3339 creation timestamp (UTC)
    pub created_at: String,
    pub status: ProjectStatus,
}

/// A task to insert for a project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub duration: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub dependencies: Vec<String>,
    /// Priority label (`high`, `medium`, `low`)
    pub priority: String,
}

impl NewTask {
    /// Create a task with only a name and medium priority
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: "medium".to_string(),
            ..Default::default()
        }
    }
}

/// A task row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: String,
    pub duration: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub dependencies: Vec<String>,
    pub priority: String,
    pub status: TaskStatus,
    pub created_at: String,
}

/// Filter for listing projects
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Case-insensitive substring match on the goal
    pub search: Option<String>,
    /// Only projects with this status
    pub status: Option<ProjectStatus>,
}

/// Progress summary for the tasks of one project
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TaskProgress {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub blocked: usize,
}

impl TaskProgress {
    /// Summarize a project's tasks
    pub fn from_tasks(tasks: &[TaskRecord]) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        Self {
            total: tasks.len(),
            completed: count(TaskStatus::Completed),
            in_progress: count(TaskStatus::InProgress),
            blocked: count(TaskStatus::Blocked),
        }
    }

    /// Completed fraction in `0.0..=1.0` (0 when there are no tasks)
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Aggregate statistics across all projects
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_projects: u64,
    pub active_projects: u64,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Task count per status label
    pub by_status: BTreeMap<String, u64>,
    /// Task count per priority label
    pub by_priority: BTreeMap<String, u64>,
}

impl StoreStats {
    /// Percentage of tasks completed (0 when there are no tasks)
    pub fn completion_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.completed_tasks as f64 / self.total_tasks as f64 * 100.0
        }
    }
}
