//! Text rendering for CLI output

use std::fmt::Write;

use colored::*;
use taskstore::{ProjectRecord, StoreStats, TaskProgress, TaskRecord, TaskStatus};

use crate::domain::{Plan, PlanSource, Priority};

fn priority_label(priority: &str) -> ColoredString {
    match priority.parse::<Priority>() {
        Ok(Priority::High) => priority.red(),
        Ok(Priority::Medium) => priority.yellow(),
        Ok(Priority::Low) => priority.green(),
        Err(_) => priority.normal(),
    }
}

fn status_label(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Pending => status.as_str().normal(),
        TaskStatus::InProgress => status.as_str().cyan(),
        TaskStatus::Completed => status.as_str().green(),
        TaskStatus::Blocked => status.as_str().red(),
    }
}

fn dates(start: Option<&str>, end: Option<&str>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => format!("{start} -> {end}"),
        (Some(start), None) => format!("from {start}"),
        (None, Some(end)) => format!("until {end}"),
        (None, None) => "unscheduled".to_string(),
    }
}

fn bullet_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}", title.bold());
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// A generated plan, optionally with the ID it was saved under
pub fn plan_text(plan: &Plan, project_id: Option<i64>) -> String {
    let mut out = String::new();

    if let PlanSource::Fallback { reason } = &plan.source {
        let _ = writeln!(out, "{} Fallback plan used: {}", "!".yellow().bold(), reason);
    }
    if let Some(id) = project_id {
        let _ = writeln!(out, "{} Saved as project {}", "✓".green(), id.to_string().cyan());
    }

    let _ = writeln!(out, "\n{} ({} tasks)", "Tasks".bold(), plan.tasks.len());
    for (index, task) in plan.tasks.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {} [{}] {}",
            index + 1,
            task.name.bold(),
            priority_label(task.priority.as_str()),
            task.duration.dimmed()
        );
        if !task.description.is_empty() {
            let _ = writeln!(out, "     {}", task.description);
        }
        let _ = writeln!(
            out,
            "     {}",
            dates(task.start_date.as_deref(), task.end_date.as_deref()).dimmed()
        );
        if !task.dependencies.is_empty() {
            let _ = writeln!(out, "     depends on: {}", task.dependencies.join(", "));
        }
    }

    if !plan.critical_path.is_empty() {
        let _ = writeln!(out, "\n{}: {}", "Critical path".bold(), plan.critical_path.join(" -> "));
    }
    if let Some(total) = &plan.estimated_total_time {
        let _ = writeln!(out, "{}: {}", "Estimated total time".bold(), total);
    }
    bullet_list(&mut out, "Risk factors", &plan.risk_factors);
    bullet_list(&mut out, "Recommendations", &plan.recommendations);
    bullet_list(&mut out, "Warnings", &plan.dangling_references());

    out
}

/// One line per project
pub fn projects_text(projects: &[ProjectRecord]) -> String {
    if projects.is_empty() {
        return "No projects found\n".to_string();
    }

    let mut out = String::new();
    for project in projects {
        let _ = writeln!(
            out,
            "{:>4}  {}  due {}  [{}]",
            project.id.to_string().cyan(),
            project.goal.lines().next().unwrap_or_default(),
            project.deadline,
            project.status
        );
    }
    out
}

/// A project with its tasks and progress
pub fn project_text(project: &ProjectRecord, tasks: &[TaskRecord], progress: &TaskProgress) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Project".bold(), project.id.to_string().cyan());
    let _ = writeln!(out, "  Goal: {}", project.goal);
    let _ = writeln!(out, "  Deadline: {}", project.deadline);
    let _ = writeln!(out, "  Status: {}", project.status);
    let _ = writeln!(
        out,
        "  Progress: {}/{} completed ({:.0}%), {} in progress, {} blocked",
        progress.completed,
        progress.total,
        progress.fraction() * 100.0,
        progress.in_progress,
        progress.blocked
    );

    let _ = writeln!(out, "\n{}", "Tasks".bold());
    for task in tasks {
        let _ = writeln!(
            out,
            "{:>5}  {} [{}] ({}) {}",
            task.id,
            task.name.bold(),
            priority_label(&task.priority),
            status_label(task.status),
            dates(task.start_date.as_deref(), task.end_date.as_deref()).dimmed()
        );
        if !task.dependencies.is_empty() {
            let _ = writeln!(out, "       depends on: {}", task.dependencies.join(", "));
        }
    }
    out
}

/// Aggregate statistics
pub fn stats_text(stats: &StoreStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Statistics".bold());
    let _ = writeln!(
        out,
        "  Projects: {} ({} active)",
        stats.total_projects, stats.active_projects
    );
    let _ = writeln!(
        out,
        "  Tasks: {} ({} completed, {:.1}%)",
        stats.total_tasks,
        stats.completed_tasks,
        stats.completion_rate()
    );

    if !stats.by_status.is_empty() {
        let _ = writeln!(out, "  By status:");
        for (status, count) in &stats.by_status {
            let _ = writeln!(out, "    {status}: {count}");
        }
    }
    if !stats.by_priority.is_empty() {
        let _ = writeln!(out, "  By priority:");
        for (priority, count) in &stats.by_priority {
            let _ = writeln!(out, "    {priority}: {count}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FallbackReason, Task};

    fn sample_plan(source: PlanSource) -> Plan {
        let mut build = Task::named("Build");
        build.dependencies = vec!["Design".to_string()];
        build.start_date = Some("2026-10-05".to_string());
        build.end_date = Some("2026-10-09".to_string());
        Plan {
            tasks: vec![Task::named("Design"), build],
            critical_path: vec!["Design".to_string(), "Build".to_string()],
            estimated_total_time: Some("2 weeks".to_string()),
            risk_factors: vec!["Scope creep".to_string()],
            recommendations: vec![],
            source,
        }
    }

    #[test]
    fn test_plan_text() {
        let text = plan_text(
            &sample_plan(PlanSource::Model {
                model: "m".to_string(),
            }),
            Some(12),
        );

        assert!(text.contains("Saved as project"));
        assert!(text.contains("Design"));
        assert!(text.contains("2026-10-05 -> 2026-10-09"));
        assert!(text.contains("depends on: Design"));
        assert!(text.contains("Scope creep"));
        assert!(!text.contains("Recommendations"));
        assert!(!text.contains("Fallback plan used"));
    }

    #[test]
    fn test_plan_text_shows_dangling_references() {
        let mut plan = sample_plan(PlanSource::Model {
            model: "m".to_string(),
        });
        plan.tasks[1].dependencies.push("Ghost".to_string());
        plan.critical_path.push("Nope".to_string());

        let text = plan_text(&plan, None);
        assert!(text.contains("Warnings"));
        assert!(text.contains("Task 'Build' depends on unknown task 'Ghost'"));
        assert!(text.contains("Critical path references unknown task 'Nope'"));

        let clean = plan_text(&sample_plan(PlanSource::Model { model: "m".to_string() }), None);
        assert!(!clean.contains("Warnings"));
    }

    #[test]
    fn test_plan_text_flags_fallback() {
        let text = plan_text(
            &sample_plan(PlanSource::Fallback {
                reason: FallbackReason::ModelUnavailable,
            }),
            None,
        );
        assert!(text.contains("Fallback plan used: model service unavailable"));
        assert!(!text.contains("Saved as project"));
    }

    #[test]
    fn test_projects_text_empty() {
        assert_eq!(projects_text(&[]), "No projects found\n");
    }

    #[test]
    fn test_stats_text() {
        let mut stats = StoreStats {
            total_projects: 2,
            active_projects: 1,
            total_tasks: 4,
            completed_tasks: 1,
            ..Default::default()
        };
        stats.by_status.insert("pending".to_string(), 3);

        let text = stats_text(&stats);
        assert!(text.contains("Projects: 2 (1 active)"));
        assert!(text.contains("25.0%"));
        assert!(text.contains("pending: 3"));
        assert!(!text.contains("By priority"));
    }

    #[test]
    fn test_dates() {
        assert_eq!(dates(None, None), "unscheduled");
        assert_eq!(dates(Some("a"), None), "from a");
        assert_eq!(dates(None, Some("b")), "until b");
    }
}
