//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taskstore::{ProjectStatus, TaskStatus};

/// Smart Task Planner - turn goals into scheduled task plans
#[derive(Debug, Parser)]
#[command(
    name = "tp",
    about = "Break goals into dependency-aware task plans using an LLM",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a task plan for a goal
    Plan {
        /// What you want to achieve
        goal: String,

        /// Deadline as YYYY-MM-DD (default: two weeks from today)
        #[arg(short, long)]
        deadline: Option<String>,

        /// Extra context appended to the goal
        #[arg(short = 'x', long)]
        context: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Print the plan without saving it
        #[arg(long)]
        no_save: bool,
    },

    /// List saved projects
    Projects {
        /// Only projects whose goal contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Only projects with this status
        #[arg(long, value_parser = parse_project_status)]
        status: Option<ProjectStatus>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a project with its tasks and progress
    Show {
        /// Project ID
        project_id: i64,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Update a task's status
    Status {
        /// Task ID
        task_id: i64,

        /// New status (pending, in_progress, completed, blocked)
        #[arg(value_parser = parse_task_status)]
        status: TaskStatus,
    },

    /// Mark a project completed
    Complete {
        /// Project ID
        project_id: i64,
    },

    /// Delete a project and its tasks
    Delete {
        /// Project ID
        project_id: i64,
    },

    /// Show statistics across all projects
    Stats {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for commands that print data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn parse_task_status(s: &str) -> Result<TaskStatus, String> {
    s.parse()
}

fn parse_project_status(s: &str) -> Result<ProjectStatus, String> {
    s.parse()
}

/// Path of the log file written by `tp`
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskplanner")
        .join("logs")
        .join("taskplanner.log")
}

/// Help footer with the log location
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
