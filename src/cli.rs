// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::model::TaskId;

/// Command-line arguments for `taskplan`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskplan",
    version,
    about = "Critical path, schedule and budget report for a project task file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project file (TOML, or JSON with a `.json` extension).
    ///
    /// Default: `Project.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Project.toml")]
    pub project: String,

    /// Evaluate as of this moment instead of the local clock.
    ///
    /// Accepts `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
    #[arg(long, value_name = "WHEN")]
    pub now: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Only list schedule rows for this task.
    #[arg(long, value_name = "ID")]
    pub task: Option<TaskId>,

    /// Only list schedule rows for tasks assigned to this resource id.
    #[arg(long, value_name = "RESOURCE")]
    pub member: Option<String>,

    /// Only list schedule rows for tasks with an assignee from this team.
    #[arg(long, value_name = "TEAM")]
    pub team: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKPLAN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate and print the task tree, without any analysis.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
