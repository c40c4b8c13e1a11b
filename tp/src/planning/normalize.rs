//! Response normalization
//!
//! Turns free-form completion text into a validated `Plan`:
//!
//! 1. strip code fences and surrounding prose down to the outermost `{...}`
//! 2. parse tolerantly (JSON5: trailing commas, single quotes, comments)
//! 3. validate the shape, substituting fallback content where it is unusable
//!
//! The result always has a non-empty task list.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::fallback::{Clock, fallback_plan, fallback_tasks};
use crate::domain::lenient;
use crate::domain::{FallbackReason, Plan, PlanSource, Task};

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```(?:json)?|```$").expect("valid fence regex"));

/// Outcome of parsing the extracted payload
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    /// A JSON object, not yet validated as a plan
    Parsed(Map<String, Value>),
    /// Text that is not a JSON(5) object
    Malformed { raw: String, error: String },
}

/// Plan fields other than `tasks`, each coerced independently
#[derive(Debug, Default, Deserialize)]
struct PlanFields {
    #[serde(default, deserialize_with = "lenient::string_list")]
    critical_path: Vec<String>,
    #[serde(default, deserialize_with = "lenient::optional_string")]
    estimated_total_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    risk_factors: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    recommendations: Vec<String>,
}

/// Strip fences and prose, leaving the outermost brace span
///
/// Returns the fence-stripped text unchanged when it holds no `{...}` span.
/// Applying it to its own output is a no-op.
pub fn extract_payload(text: &str) -> &str {
    let unfenced = strip_fences(text);
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

fn strip_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(m) = FENCE_RE.find(text)
        && m.start() == 0
    {
        text = &text[m.end()..];
    }
    if let Some(m) = FENCE_RE.find_iter(text).last()
        && m.end() == text.len()
    {
        text = &text[..m.start()];
    }
    text.trim()
}

/// Parse an extracted payload with the tolerant parser
pub fn parse_payload(payload: &str) -> ParsedPayload {
    debug!(payload_len = payload.len(), "parse_payload: called");
    match json5::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => ParsedPayload::Parsed(map),
        Ok(other) => ParsedPayload::Malformed {
            raw: payload.to_string(),
            error: format!("expected a JSON object, found {}", kind_of(&other)),
        },
        Err(e) => ParsedPayload::Malformed {
            raw: payload.to_string(),
            error: e.to_string(),
        },
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Valid tasks from a parsed `tasks` value; `None` when it is not a list
fn collect_tasks(value: Option<Value>) -> Option<Vec<Task>> {
    let Some(Value::Array(items)) = value else {
        return None;
    };

    let tasks = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match Task::from_value(item) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!(index, error = %e, "Dropping invalid task from model response");
                None
            }
        })
        .collect();
    Some(tasks)
}

/// Convert raw completion text into a plan
///
/// `model` records which model produced `text`; `goal`, `deadline` and
/// `clock` drive the fallback schedule when one is needed.
pub fn normalize(text: &str, model: &str, goal: &str, deadline: &str, clock: &dyn Clock) -> Plan {
    debug!(%model, text_len = text.len(), "normalize: called");
    let payload = extract_payload(text);

    let mut map = match parse_payload(payload) {
        ParsedPayload::Parsed(map) => map,
        ParsedPayload::Malformed { raw, error } => {
            warn!(%model, %error, %raw, "Model response could not be parsed, using fallback plan");
            return fallback_plan(goal, deadline, clock, FallbackReason::MalformedResponse);
        }
    };

    let tasks = collect_tasks(map.remove("tasks"));
    let fields: PlanFields = serde_json::from_value(Value::Object(map)).unwrap_or_default();

    let (tasks, source) = match tasks {
        Some(tasks) if !tasks.is_empty() => (
            tasks,
            PlanSource::Model {
                model: model.to_string(),
            },
        ),
        _ => {
            warn!(%model, "Invalid task structure in model response, using fallback tasks");
            (
                fallback_tasks(goal, deadline, clock),
                PlanSource::Fallback {
                    reason: FallbackReason::MissingTasks,
                },
            )
        }
    };

    Plan {
        tasks,
        critical_path: fields.critical_path,
        estimated_total_time: fields.estimated_total_time,
        risk_factors: fields.risk_factors,
        recommendations: fields.recommendations,
        source,
    }
}
