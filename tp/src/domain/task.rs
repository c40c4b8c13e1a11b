//! Task - one actionable unit within a Plan

use serde::{Deserialize, Serialize};

use super::lenient;
use super::priority::Priority;

/// One actionable unit within a plan
///
/// Dependencies are weak references by task name; dangling names are
/// reported by `Plan::dangling_references`, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task name, also the key other tasks use to depend on it
    #[serde(deserialize_with = "lenient::name")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,

    /// Human-readable duration, e.g. "2 days"
    #[serde(default, deserialize_with = "lenient::string")]
    pub duration: String,

    /// ISO `YYYY-MM-DD`, not validated
    #[serde(default, deserialize_with = "lenient::optional_string", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// ISO `YYYY-MM-DD`, not validated
    #[serde(default, deserialize_with = "lenient::optional_string", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub dependencies: Vec<String>,

    #[serde(default, deserialize_with = "lenient::priority")]
    pub priority: Priority,

    #[serde(default, deserialize_with = "lenient::optional_string", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Task {
    /// Create a task with only a name set
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            duration: String::new(),
            start_date: None,
            end_date: None,
            dependencies: Vec::new(),
            priority: Priority::default(),
            category: None,
        }
    }

    /// Parse one element of a model's `tasks` array
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl From<&Task> for taskstore::NewTask {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone(),
            duration: task.duration.clone(),
            start_date: task.start_date.clone(),
            end_date: task.end_date.clone(),
            dependencies: task.dependencies.clone(),
            priority: task.priority.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_task_deserialize() {
        let task = Task::from_value(json!({
            "name": "Design schema",
            "description": "Model the tables",
            "duration": "2 days",
            "start_date": "2026-10-20",
            "end_date": "2026-10-22",
            "dependencies": ["Gather requirements"],
            "priority": "high",
            "category": "Planning"
        }))
        .unwrap();

        assert_eq!(task.name, "Design schema");
        assert_eq!(task.duration, "2 days");
        assert_eq!(task.start_date.as_deref(), Some("2026-10-20"));
        assert_eq!(task.dependencies, vec!["Gather requirements"]);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category.as_deref(), Some("Planning"));
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let task = Task::from_value(json!({"name": "Only a name"})).unwrap();
        assert_eq!(task, Task::named("Only a name"));
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn test_unrecognized_priority_defaults_to_medium() {
        let task = Task::from_value(json!({"name": "t", "priority": "urgent"})).unwrap();
        assert_eq!(task.priority, Priority::Medium);

        let task = Task::from_value(json!({"name": "t", "priority": 1})).unwrap();
        assert_eq!(task.priority, Priority::Medium);

        let task = Task::from_value(json!({"name": "t", "priority": "LOW"})).unwrap();
        assert_eq!(task.priority, Priority::Low);
    }

    #[test]
    fn test_scalar_coercion() {
        let task = Task::from_value(json!({
            "name": "t",
            "duration": 3,
            "dependencies": "Setup",
            "start_date": "",
            "category": null
        }))
        .unwrap();
        assert_eq!(task.duration, "3");
        assert_eq!(task.dependencies, vec!["Setup"]);
        assert_eq!(task.start_date, None);
        assert_eq!(task.category, None);
    }

    #[test]
    fn test_dependency_list_drops_non_scalars() {
        let task = Task::from_value(json!({
            "name": "t",
            "dependencies": ["A", {"nested": true}, "", 7]
        }))
        .unwrap();
        assert_eq!(task.dependencies, vec!["A", "7"]);
    }

    #[test]
    fn test_missing_or_blank_name_is_rejected() {
        assert!(Task::from_value(json!({"description": "nameless"})).is_err());
        assert!(Task::from_value(json!({"name": "   "})).is_err());
        assert!(Task::from_value(json!({"name": null})).is_err());
        assert!(Task::from_value(json!("just a string")).is_err());
    }

    #[test]
    fn test_serialize_skips_absent_optionals() {
        let value = serde_json::to_value(Task::named("t")).unwrap();
        assert!(value.get("start_date").is_none());
        assert!(value.get("category").is_none());
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["dependencies"], json!([]));
    }

    #[test]
    fn test_into_new_task() {
        let mut task = Task::named("Ship");
        task.priority = Priority::High;
        task.dependencies = vec!["Build".to_string()];

        let new_task = taskstore::NewTask::from(&task);
        assert_eq!(new_task.name, "Ship");
        assert_eq!(new_task.priority, "high");
        assert_eq!(new_task.dependencies, vec!["Build"]);
    }
}
