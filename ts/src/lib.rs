//! TaskStore - SQLite persistence for planned projects
//!
//! Stores projects (a goal plus deadline) and the tasks generated for them in
//! a two-table SQLite schema. The planner core never touches this crate; the
//! `tp` CLI uses it to persist plans and track task status afterwards.
//!
//! # Schema
//!
//! ```text
//! projects(id, goal, deadline, created_at, status)
//! tasks(id, project_id -> projects.id, task_name, description,
//!       estimated_duration, start_date, end_date, dependencies (JSON),
//!       priority, status, created_at)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use taskstore::{NewTask, Store, TaskStatus};
//!
//! let mut store = Store::open("tasks.db")?;
//! let project_id = store.save_project("Launch the beta", "2026-11-02")?;
//! let ids = store.save_tasks(project_id, &[NewTask::named("Write landing page")])?;
//! store.update_task_status(ids[0], TaskStatus::Completed)?;
//! ```

mod error;
mod models;
mod store;

pub use error::StoreError;
pub use models::{
    NewTask, ProjectFilter, ProjectRecord, ProjectStatus, StoreStats, TaskProgress, TaskRecord, TaskStatus,
};
pub use store::Store;

/// Result alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
