//! SQLite-backed project and task store

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, params_from_iter};

use crate::Result;
use crate::error::StoreError;
use crate::models::{
    NewTask, ProjectFilter, ProjectRecord, ProjectStatus, StoreStats, TaskRecord, TaskStatus,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    goal TEXT NOT NULL,
    deadline TEXT,
    created_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    task_name TEXT NOT NULL,
    description TEXT,
    estimated_duration TEXT,
    start_date TEXT,
    end_date TEXT,
    dependencies TEXT,
    priority TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    FOREIGN KEY (project_id) REFERENCES projects (id)
);

CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks (project_id);
"#;

const PROJECT_COLUMNS: &str = "id, goal, deadline, created_at, status";

const TASK_COLUMNS: &str = "id, project_id, task_name, description, estimated_duration, start_date, end_date, \
                            dependencies, priority, status, created_at";

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn insert_tasks(tx: &Transaction<'_>, project_id: i64, tasks: &[NewTask], created_at: &str) -> Result<Vec<i64>> {
    let mut stmt = tx.prepare(
        "INSERT INTO tasks (project_id, task_name, description, estimated_duration, start_date, end_date, \
         dependencies, priority, status, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    let mut ids = Vec::with_capacity(tasks.len());
    for task in tasks {
        let dependencies = serde_json::to_string(&task.dependencies)?;
        stmt.execute(params![
            project_id,
            task.name,
            task.description,
            task.duration,
            task.start_date,
            task.end_date,
            dependencies,
            task.priority,
            TaskStatus::Pending.as_str(),
            created_at,
        ])?;
        ids.push(tx.last_insert_rowid());
    }
    Ok(ids)
}

/// Project row as read from SQLite, before status parsing
struct ProjectRow {
    id: i64,
    goal: String,
    deadline: Option<String>,
    created_at: String,
    status: String,
}

impl ProjectRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            goal: row.get(1)?,
            deadline: row.get(2)?,
            created_at: row.get(3)?,
            status: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<ProjectRecord> {
        let status = self.status.parse::<ProjectStatus>().map_err(|_| StoreError::InvalidValue {
            field: "projects.status",
            value: self.status.clone(),
        })?;
        Ok(ProjectRecord {
            id: self.id,
            goal: self.goal,
            deadline: self.deadline.unwrap_or_default(),
            created_at: self.created_at,
            status,
        })
    }
}

/// Task row as read from SQLite, before JSON and status parsing
struct TaskRow {
    id: i64,
    project_id: i64,
    name: String,
    description: Option<String>,
    duration: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    dependencies: Option<String>,
    priority: Option<String>,
    status: String,
    created_at: String,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            duration: row.get(4)?,
            start_date: row.get(5)?,
            end_date: row.get(6)?,
            dependencies: row.get(7)?,
            priority: row.get(8)?,
            status: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_record(self) -> Result<TaskRecord> {
        let status = self.status.parse::<TaskStatus>().map_err(|_| StoreError::InvalidValue {
            field: "tasks.status",
            value: self.status.clone(),
        })?;
        let dependencies = match self.dependencies.as_deref() {
            None | Some("") => Vec::new(),
            Some(json) => serde_json::from_str(json)?,
        };
        Ok(TaskRecord {
            id: self.id,
            project_id: self.project_id,
            name: self.name,
            description: self.description.unwrap_or_default(),
            duration: self.duration.unwrap_or_default(),
            start_date: self.start_date,
            end_date: self.end_date,
            dependencies,
            priority: self.priority.unwrap_or_else(|| "medium".to_string()),
            status,
            created_at: self.created_at,
        })
    }
}

/// Persistent store for projects and their tasks
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) a store at the given database path
    ///
    /// Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Store::open: {}", path.display());
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self::init(Connection::open(path)?)?;
        info!("Opened task store at {}", path.display());
        Ok(store)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Save a new project and return its id
    pub fn save_project(&self, goal: &str, deadline: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO projects (goal, deadline, created_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![goal, deadline, now(), ProjectStatus::Active.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Store::save_project: saved project {}", id);
        Ok(id)
    }

    /// Save tasks for a project in one transaction, all as `pending`
    ///
    /// Returns the new task ids in input order.
    pub fn save_tasks(&mut self, project_id: i64, tasks: &[NewTask]) -> Result<Vec<i64>> {
        if self.get_project(project_id)?.is_none() {
            return Err(StoreError::NotFound {
                kind: "project",
                id: project_id,
            });
        }

        let tx = self.conn.transaction()?;
        let ids = insert_tasks(&tx, project_id, tasks, &now())?;
        tx.commit()?;

        debug!("Store::save_tasks: saved {} tasks for project {}", ids.len(), project_id);
        Ok(ids)
    }

    /// Save a project together with its tasks in one transaction
    ///
    /// Nothing is written when any insert fails. Returns the project id.
    pub fn save_plan(&mut self, goal: &str, deadline: &str, tasks: &[NewTask]) -> Result<i64> {
        let created_at = now();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO projects (goal, deadline, created_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![goal, deadline, created_at, ProjectStatus::Active.as_str()],
        )?;
        let project_id = tx.last_insert_rowid();
        let ids = insert_tasks(&tx, project_id, tasks, &created_at)?;
        tx.commit()?;

        info!("Store::save_plan: saved project {} with {} tasks", project_id, ids.len());
        Ok(project_id)
    }

    /// Fetch one project
    pub fn get_project(&self, project_id: i64) -> Result<Option<ProjectRecord>> {
        let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![project_id], ProjectRow::from_row)
            .optional()?;
        row.map(ProjectRow::into_record).transpose()
    }

    /// List projects, newest first
    pub fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<ProjectRecord>> {
        let mut sql = format!("SELECT {} FROM projects", PROJECT_COLUMNS);
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(search) = filter.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            values.push(format!("%{}%", search));
            clauses.push(format!("goal LIKE ?{}", values.len()));
        }
        if let Some(status) = filter.status {
            values.push(status.as_str().to_string());
            clauses.push(format!("status = ?{}", values.len()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), ProjectRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ProjectRow::into_record).collect()
    }

    /// All tasks of a project in insertion order
    pub fn project_tasks(&self, project_id: i64) -> Result<Vec<TaskRecord>> {
        let sql = format!("SELECT {} FROM tasks WHERE project_id = ?1 ORDER BY id", TASK_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![project_id], TaskRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(TaskRow::into_record).collect()
    }

    /// Change the status of one task
    pub fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), task_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound { kind: "task", id: task_id });
        }
        debug!("Store::update_task_status: task {} -> {}", task_id, status);
        Ok(())
    }

    /// Change the status of one project
    pub fn update_project_status(&self, project_id: i64, status: ProjectStatus) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET status = ?1 WHERE id = ?2",
            params![status.as_str(), project_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                kind: "project",
                id: project_id,
            });
        }
        Ok(())
    }

    /// Delete a project and all of its tasks
    ///
    /// Returns `false` when no such project existed.
    pub fn delete_project(&mut self, project_id: i64) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let tasks = tx.execute("DELETE FROM tasks WHERE project_id = ?1", params![project_id])?;
        let projects = tx.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
        tx.commit()?;

        debug!(
            "Store::delete_project: project {} removed={} tasks removed={}",
            project_id,
            projects > 0,
            tasks
        );
        Ok(projects > 0)
    }

    /// Aggregate statistics over every project and task
    pub fn stats(&self) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = self.conn.query_row(sql, [], |r| r.get(0))?;
            Ok(n as u64)
        };

        Ok(StoreStats {
            total_projects: count("SELECT COUNT(*) FROM projects")?,
            active_projects: count("SELECT COUNT(*) FROM projects WHERE status = 'active'")?,
            total_tasks: count("SELECT COUNT(*) FROM tasks")?,
            completed_tasks: count("SELECT COUNT(*) FROM tasks WHERE status = 'completed'")?,
            by_status: self.grouped_counts("SELECT status, COUNT(*) FROM tasks GROUP BY status")?,
            by_priority: self.grouped_counts(
                "SELECT COALESCE(priority, 'medium'), COUNT(*) FROM tasks GROUP BY COALESCE(priority, 'medium')",
            )?,
        })
    }

    fn grouped_counts(&self, sql: &str) -> Result<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows.into_iter().map(|(k, n)| (k, n as u64)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn task(name: &str, priority: &str, deps: &[&str]) -> NewTask {
        NewTask {
            name: name.to_string(),
            description: format!("{} description", name),
            duration: "2 days".to_string(),
            start_date: Some("2026-10-20".to_string()),
            end_date: Some("2026-10-22".to_string()),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            priority: priority.to_string(),
        }
    }

    #[test]
    fn test_save_and_get_project() {
        let store = Store::open_in_memory().unwrap();
        let id = store.save_project("Launch the beta", "2026-11-02").unwrap();

        let project = store.get_project(id).unwrap().unwrap();
        assert_eq!(project.goal, "Launch the beta");
        assert_eq!(project.deadline, "2026-11-02");
        assert_eq!(project.status, ProjectStatus::Active);
        assert!(store.get_project(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_save_tasks_round_trip() {
        let mut store = Store::open_in_memory().unwrap();
        let project_id = store.save_project("Write a paper", "2026-12-01").unwrap();

        let ids = store
            .save_tasks(
                project_id,
                &[
                    task("Research", "high", &[]),
                    task("Draft", "medium", &["Research"]),
                    NewTask::named("Submit"),
                ],
            )
            .unwrap();
        assert_eq!(ids.len(), 3);

        let tasks = store.project_tasks(project_id).unwrap();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].name, "Research");
        assert_eq!(tasks[1].dependencies, vec!["Research".to_string()]);
        assert_eq!(tasks[1].priority, "medium");
        assert_eq!(tasks[2].start_date, None);
        assert!(tasks.iter().all(|t| t.status == TaskStatus::Pending));
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_save_plan_writes_project_and_tasks() {
        let mut store = Store::open_in_memory().unwrap();
        let project_id = store
            .save_plan(
                "Run a workshop",
                "2026-12-05",
                &[task("Book room", "high", &[]), task("Invite", "low", &["Book room"])],
            )
            .unwrap();

        let project = store.get_project(project_id).unwrap().unwrap();
        assert_eq!(project.goal, "Run a workshop");
        let tasks = store.project_tasks(project_id).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].dependencies, vec!["Book room".to_string()]);
    }

    #[test]
    fn test_save_plan_is_all_or_nothing() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON tasks WHEN NEW.task_name = 'Bad' \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = store.save_plan("Half saved", "2026-12-05", &[task("Good", "high", &[]), NewTask::named("Bad")]);
        assert!(result.is_err());
        assert!(store.list_projects(&ProjectFilter::default()).unwrap().is_empty());
        assert_eq!(store.stats().unwrap().total_tasks, 0);
    }

    #[test]
    fn test_save_tasks_unknown_project() {
        let mut store = Store::open_in_memory().unwrap();
        let err = store.save_tasks(99, &[NewTask::named("Orphan")]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_projects_newest_first_with_filters() {
        let store = Store::open_in_memory().unwrap();
        let first = store.save_project("Build a mobile app", "2026-11-01").unwrap();
        let second = store.save_project("Plan a wedding", "2027-05-01").unwrap();
        let third = store.save_project("Build a website", "2026-12-01").unwrap();
        store.update_project_status(second, ProjectStatus::Completed).unwrap();

        let all = store.list_projects(&ProjectFilter::default()).unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![third, second, first]);

        let builds = store
            .list_projects(&ProjectFilter {
                search: Some("build".to_string()),
                status: None,
            })
            .unwrap();
        assert_eq!(builds.len(), 2);

        let completed = store
            .list_projects(&ProjectFilter {
                search: None,
                status: Some(ProjectStatus::Completed),
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].goal, "Plan a wedding");
    }

    #[test]
    fn test_update_task_status() {
        let mut store = Store::open_in_memory().unwrap();
        let project_id = store.save_project("Goal", "2026-11-01").unwrap();
        let ids = store.save_tasks(project_id, &[NewTask::named("Only task")]).unwrap();

        store.update_task_status(ids[0], TaskStatus::Blocked).unwrap();
        let tasks = store.project_tasks(project_id).unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Blocked);

        let err = store.update_task_status(12345, TaskStatus::Completed).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_project_removes_tasks() {
        let mut store = Store::open_in_memory().unwrap();
        let keep = store.save_project("Keep", "2026-11-01").unwrap();
        let gone = store.save_project("Drop", "2026-11-01").unwrap();
        store.save_tasks(keep, &[NewTask::named("a")]).unwrap();
        store.save_tasks(gone, &[NewTask::named("b"), NewTask::named("c")]).unwrap();

        assert!(store.delete_project(gone).unwrap());
        assert!(store.get_project(gone).unwrap().is_none());
        assert!(store.project_tasks(gone).unwrap().is_empty());
        assert_eq!(store.project_tasks(keep).unwrap().len(), 1);

        assert!(!store.delete_project(gone).unwrap());
    }

    #[test]
    fn test_stats() {
        let mut store = Store::open_in_memory().unwrap();
        let a = store.save_project("A", "2026-11-01").unwrap();
        let b = store.save_project("B", "2026-11-01").unwrap();
        store.update_project_status(b, ProjectStatus::Completed).unwrap();
        let ids = store
            .save_tasks(
                a,
                &[task("one", "high", &[]), task("two", "high", &[]), task("three", "low", &[])],
            )
            .unwrap();
        store.update_task_status(ids[0], TaskStatus::Completed).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.by_status.get("pending"), Some(&2));
        assert_eq!(stats.by_status.get("completed"), Some(&1));
        assert_eq!(stats.by_priority.get("high"), Some(&2));
        assert_eq!(stats.by_priority.get("low"), Some(&1));
    }

    #[test]
    fn test_open_creates_parent_dirs_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("tasks.db");

        let id = {
            let store = Store::open(&db_path).unwrap();
            store.save_project("Persisted", "2026-11-01").unwrap()
        };

        let reopened = Store::open(&db_path).unwrap();
        let project = reopened.get_project(id).unwrap().unwrap();
        assert_eq!(project.goal, "Persisted");
    }
}
