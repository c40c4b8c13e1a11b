//! Fallback plan generation
//!
//! Produces a deterministic three-phase schedule when model output cannot be
//! used. The result depends only on the goal, the deadline and the clock.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, warn};

use crate::domain::{FallbackReason, Plan, PlanSource, Priority, Task};

/// Minimum span, in days, the fallback schedule is laid over
const MIN_TOTAL_DAYS: i64 = 5;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "now" for schedule generation
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Days available for the schedule and the length of one phase unit
///
/// Whole days are counted from `now` to midnight at the start of the
/// deadline date, floored at five.
pub fn schedule_span(now: NaiveDateTime, deadline: NaiveDate) -> (i64, i64) {
    let until = deadline.and_time(NaiveTime::MIN) - now;
    let total_days = until.num_days().max(MIN_TOTAL_DAYS);
    let unit = (total_days / 5).max(1);
    (total_days, unit)
}

fn fmt_date(at: NaiveDateTime) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// The fallback task list for a goal and deadline
///
/// Never fails: a deadline that is not `YYYY-MM-DD` yields one placeholder task.
pub fn fallback_tasks(goal: &str, deadline: &str, clock: &dyn Clock) -> Vec<Task> {
    debug!(%deadline, "fallback_tasks: called");
    let deadline_date = match NaiveDate::parse_from_str(deadline.trim(), DATE_FORMAT) {
        Ok(date) => date,
        Err(e) => {
            warn!(%deadline, error = %e, "Unparseable deadline, using placeholder task");
            return vec![Task {
                description: "Basic fallback".to_string(),
                duration: "2 days".to_string(),
                ..Task::named("Project Planning")
            }];
        }
    };

    let now = clock.now();
    let (total_days, unit) = schedule_span(now, deadline_date);
    debug!(total_days, unit, "fallback_tasks: schedule span");
    let day = |n: i64| now + Duration::days(n);

    vec![
        Task {
            name: "Research & Planning".to_string(),
            description: format!("Research and create a detailed plan for: {goal}"),
            duration: format!("{unit} days"),
            start_date: Some(fmt_date(now)),
            end_date: Some(fmt_date(day(unit))),
            dependencies: vec![],
            priority: Priority::High,
            category: Some("Planning".to_string()),
        },
        Task {
            name: "Implementation".to_string(),
            description: format!("Develop and integrate the main components for: {goal}"),
            duration: format!("{} days", unit * 2),
            start_date: Some(fmt_date(day(unit))),
            end_date: Some(fmt_date(day(unit * 3))),
            dependencies: vec!["Research & Planning".to_string()],
            priority: Priority::High,
            category: Some("Development".to_string()),
        },
        Task {
            name: "Testing & Review".to_string(),
            description: format!("Test, fix issues and finalize: {goal}"),
            duration: format!("{unit} days"),
            start_date: Some(fmt_date(day(unit * 3))),
            end_date: Some(deadline_date.format(DATE_FORMAT).to_string()),
            dependencies: vec!["Implementation".to_string()],
            priority: Priority::Medium,
            category: Some("Testing".to_string()),
        },
    ]
}

/// A complete substitute plan, used when nothing from the model is usable
pub fn fallback_plan(goal: &str, deadline: &str, clock: &dyn Clock, reason: FallbackReason) -> Plan {
    debug!(%reason, "fallback_plan: called");
    let (risk, recommendation) = match reason {
        FallbackReason::ModelUnavailable => ("LLM service unavailable", "Check connectivity and API key, then retry."),
        FallbackReason::MalformedResponse | FallbackReason::MissingTasks => {
            ("Invalid LLM response", "Please retry or verify input.")
        }
    };

    Plan {
        tasks: fallback_tasks(goal, deadline, clock),
        critical_path: vec![],
        estimated_total_time: Some("Unknown".to_string()),
        risk_factors: vec![risk.to_string()],
        recommendations: vec![recommendation.to_string()],
        source: PlanSource::Fallback { reason },
    }
}
