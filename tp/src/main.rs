//! Smart Task Planner
//!
//! CLI entry point for generating, saving and tracking task plans.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate};
use clap::{CommandFactory, FromArgMatches};
use colored::*;
use eyre::{Context, Result, bail};
use tracing::{debug, info};

use taskplanner::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use taskplanner::config::Config;
use taskplanner::llm::create_client;
use taskplanner::planning::{SystemClock, TaskPlanner};
use taskplanner::prompts::{PromptLoader, compose_goal};
use taskplanner::render;
use taskstore::{NewTask, ProjectFilter, ProjectStatus, Store, TaskProgress, TaskStatus};

/// Days from today used when no deadline is given
const DEFAULT_DEADLINE_DAYS: i64 = 14;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn open_store(config: &Config) -> Result<Store> {
    let path = config.storage.expanded_db_path();
    debug!(?path, "open_store: called");
    Store::open(&path).context(format!("Failed to open task database at {}", path.display()))
}

fn resolve_deadline(deadline: Option<String>) -> Result<String> {
    match deadline {
        Some(deadline) => {
            let deadline = deadline.trim().to_string();
            if NaiveDate::parse_from_str(&deadline, "%Y-%m-%d").is_err() {
                bail!("Invalid deadline '{}': expected YYYY-MM-DD", deadline);
            }
            Ok(deadline)
        }
        None => {
            let date = Local::now().date_naive() + Duration::days(DEFAULT_DEADLINE_DAYS);
            Ok(date.format("%Y-%m-%d").to_string())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

async fn cmd_plan(
    config: &Config,
    goal: &str,
    deadline: Option<String>,
    context: Option<&str>,
    format: OutputFormat,
    no_save: bool,
) -> Result<()> {
    config.validate()?;
    let deadline = resolve_deadline(deadline)?;
    let goal = compose_goal(goal, context);

    let llm = create_client(&config.llm).context("Failed to create LLM client")?;
    let root = std::env::current_dir().context("Failed to read current directory")?;
    let planner = TaskPlanner::new(
        llm,
        config.planner_settings(),
        PromptLoader::new(root),
        Arc::new(SystemClock),
    );

    if format == OutputFormat::Text {
        println!("Planning \"{}\" (deadline {})...", goal.lines().next().unwrap_or_default(), deadline);
    }
    let plan = planner.generate_plan(&goal, &deadline).await?;

    let project_id = if no_save {
        None
    } else {
        let mut store = open_store(config)?;
        let tasks: Vec<NewTask> = plan.tasks.iter().map(NewTask::from).collect();
        let project_id = store.save_plan(&goal, &deadline, &tasks)?;
        info!(project_id, task_count = tasks.len(), "Saved plan");
        Some(project_id)
    };

    match format {
        OutputFormat::Text => print!("{}", render::plan_text(&plan, project_id)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "project_id": project_id,
            "goal": goal,
            "deadline": deadline,
            "plan": plan,
        }))?,
    }
    Ok(())
}

fn cmd_projects(
    config: &Config,
    search: Option<String>,
    status: Option<ProjectStatus>,
    format: OutputFormat,
) -> Result<()> {
    let store = open_store(config)?;
    let projects = store.list_projects(&ProjectFilter { search, status })?;

    match format {
        OutputFormat::Text => print!("{}", render::projects_text(&projects)),
        OutputFormat::Json => print_json(&projects)?,
    }
    Ok(())
}

fn cmd_show(config: &Config, project_id: i64, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let Some(project) = store.get_project(project_id)? else {
        bail!("Project {} not found", project_id);
    };
    let tasks = store.project_tasks(project_id)?;
    let progress = TaskProgress::from_tasks(&tasks);

    match format {
        OutputFormat::Text => print!("{}", render::project_text(&project, &tasks, &progress)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "project": project,
            "tasks": tasks,
            "progress": progress,
        }))?,
    }
    Ok(())
}

fn cmd_status(config: &Config, task_id: i64, status: TaskStatus) -> Result<()> {
    let store = open_store(config)?;
    store.update_task_status(task_id, status)?;
    println!("{} Task {} is now {}", "✓".green(), task_id, status.to_string().cyan());
    Ok(())
}

fn cmd_complete(config: &Config, project_id: i64) -> Result<()> {
    let store = open_store(config)?;
    store.update_project_status(project_id, ProjectStatus::Completed)?;
    println!("{} Project {} marked completed", "✓".green(), project_id);
    Ok(())
}

fn cmd_delete(config: &Config, project_id: i64) -> Result<()> {
    let mut store = open_store(config)?;
    if !store.delete_project(project_id)? {
        bail!("Project {} not found", project_id);
    }
    println!("{} Deleted project: {}", "✓".green(), project_id);
    Ok(())
}

fn cmd_stats(config: &Config, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let stats = store.stats()?;

    match format {
        OutputFormat::Text => print!("{}", render::stats_text(&stats)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "stats": stats,
            "completion_rate": stats.completion_rate(),
        }))?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with an after_help that shows where logs go
    let cmd = Cli::command().after_help(generate_after_help());

    // Parse CLI arguments using the modified command
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("taskplanner loaded config: primary={}", config.llm.primary_model);

    // Dispatch command
    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan {
            goal,
            deadline,
            context,
            format,
            no_save,
        } => cmd_plan(&config, &goal, deadline, context.as_deref(), format, no_save).await,
        Command::Projects { search, status, format } => cmd_projects(&config, search, status, format),
        Command::Show { project_id, format } => cmd_show(&config, project_id, format),
        Command::Status { task_id, status } => cmd_status(&config, task_id, status),
        Command::Complete { project_id } => cmd_complete(&config, project_id),
        Command::Delete { project_id } => cmd_delete(&config, project_id),
        Command::Stats { format } => cmd_stats(&config, format),
    }
}
