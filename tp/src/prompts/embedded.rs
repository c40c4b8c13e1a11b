//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Goal-to-task-breakdown prompt
pub const TASK_BREAKDOWN: &str = include_str!("../../prompts/task-breakdown.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "task-breakdown" => Some(TASK_BREAKDOWN),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
