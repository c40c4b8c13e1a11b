//! Planning pipeline
//!
//! Goal and deadline in, validated `Plan` out. Model output is untrusted:
//! the normalizer recovers what it can and the fallback generator fills in
//! the rest, so a plan always comes back with at least one task.

mod fallback;
mod normalize;
mod planner;

pub use fallback::{Clock, FixedClock, SystemClock, fallback_plan, fallback_tasks, schedule_span};
pub use normalize::{ParsedPayload, extract_payload, normalize, parse_payload};
pub use planner::{DEFAULT_SYSTEM_PROMPT, PlannerSettings, TaskPlanner};
