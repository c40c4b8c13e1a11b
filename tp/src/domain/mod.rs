//! Domain types for the task planner
//!
//! `Plan` and `Task` are the structured result of one planning request. Their
//! serialized field names are the schema the model is asked to produce and the
//! one persistence and display code read back, so they must stay stable.

pub(crate) mod lenient;
mod plan;
mod priority;
mod task;

pub use plan::{FallbackReason, Plan, PlanSource};
pub use priority::Priority;
pub use task::Task;

// Status is owned by the persistence layer, never set by the planner
pub use taskstore::TaskStatus;
