// src/lib.rs

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod model;
pub mod reorder;
pub mod schedule;
pub mod types;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::AggregateReport;
use crate::cli::{CliArgs, OutputFormat};
use crate::config::loader::load_and_validate;
use crate::config::model::ProjectFile;
use crate::dag::{CriticalPathResult, TaskGraph};
use crate::engine::{ProjectCore, ProjectRegistry, ProjectSnapshot, RuntimeOptions};
use crate::model::{Project, Task};
use crate::schedule::{ScheduleResult, schedule};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project file loading and validation
/// - the project runtime (critical path + rollups)
/// - report output
pub async fn run(args: CliArgs) -> Result<()> {
    let project_path = PathBuf::from(&args.project);
    let file = load_and_validate(&project_path)
        .with_context(|| format!("loading {}", project_path.display()))?;

    if args.dry_run {
        print_dry_run(&file)?;
        return Ok(());
    }

    let now = resolve_now(args.now.as_deref())?;
    info!(project = %file.project.id, %now, "evaluating project");

    let registry = ProjectRegistry::new(RuntimeOptions::default());
    let handle = registry.open(ProjectCore::from_file(file)?)?;

    handle.recompute_critical_path().await?;
    let report = handle.refresh_rollups(now).await?;
    let snapshot = handle.snapshot();
    if snapshot.stale.any() {
        warn!(stale = ?snapshot.stale, "report built from stale results");
    }

    let rows = selected_rows(&snapshot, &args, now)?;
    match args.format {
        OutputFormat::Json => print_json(&snapshot, &report, rows)?,
        OutputFormat::Text => print_text(&snapshot, &report, &rows),
    }

    registry.close_all().await?;
    Ok(())
}

/// `--now` if given, the local clock otherwise. The clock is only read here.
fn resolve_now(arg: Option<&str>) -> Result<NaiveDateTime> {
    let Some(s) = arg else {
        return Ok(chrono::Local::now().naive_local());
    };

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|e| anyhow!("invalid --now value '{s}': {e}"))
}

/// One schedule row for output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Row {
    id: u64,
    name: String,
    start_date: NaiveDate,
    duration: u32,
    progress: u8,
    critical: bool,
    total_float: Option<i64>,
    #[serde(flatten)]
    schedule: ScheduleResult,
}

fn selected_rows(snapshot: &ProjectSnapshot, args: &CliArgs, now: NaiveDateTime) -> Result<Vec<Row>> {
    let tasks: Vec<&Task> = match (&args.task, &args.member, &args.team) {
        (Some(id), _, _) => vec![snapshot.tasks.require(*id)?],
        (None, Some(member), _) => snapshot.tasks_for_member(member),
        (None, None, Some(team)) => snapshot.tasks_for_team(team),
        (None, None, None) => snapshot.tasks.tasks().collect(),
    };

    debug!(rows = tasks.len(), "selected schedule rows");

    Ok(tasks
        .into_iter()
        .map(|t| Row {
            id: t.id,
            name: t.name.clone(),
            start_date: t.start_date,
            duration: t.duration,
            progress: t.progress,
            critical: snapshot.is_critical(t.id),
            total_float: snapshot
                .critical_path
                .as_ref()
                .and_then(|cp| cp.timings.get(&t.id))
                .map(|timing| timing.total_float),
            schedule: schedule(t, now),
        })
        .collect())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    project: &'a Project,
    report: &'a AggregateReport,
    critical_path: Option<&'a CriticalPathResult>,
    tasks: Vec<Row>,
}

fn print_json(snapshot: &ProjectSnapshot, report: &AggregateReport, rows: Vec<Row>) -> Result<()> {
    let out = JsonOutput {
        project: &snapshot.project,
        report,
        critical_path: snapshot.critical_path.as_ref(),
        tasks: rows,
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn fmt_money(v: f64) -> String {
    format!("{v:.2}")
}

fn print_text(snapshot: &ProjectSnapshot, report: &AggregateReport, rows: &[Row]) {
    let project = &snapshot.project;

    println!("project {} ({})", project.name, project.id);
    println!("  status: {:?}", project.status);
    if let (Some(start), Some(end)) = (report.project_start, report.project_end) {
        println!("  span: {start} .. {end}");
    }
    println!("  critical path: {} days", project.critical_path_days);
    match report.overall_progress {
        Some(p) => println!("  progress: {p:.1}%"),
        None => println!("  progress: N/A"),
    }
    println!(
        "  completed: {:.1}%  overdue: {:.1}%  active today: {}",
        report.tasks_completed_rate, report.overdue_rate, report.active_tasks_today
    );
    println!(
        "  cost: {} (tasks {} + resources {})",
        fmt_money(report.actual_budget),
        fmt_money(report.task_cost),
        fmt_money(report.resource_cost)
    );
    if let Some(budget) = report.budget {
        let flag = if report.budget_exceeded { "  EXCEEDED" } else { "" };
        println!("  budget: {}{flag}", fmt_money(budget));
    }
    if !report.weekly_completion_histogram.is_empty() {
        let weeks: Vec<String> = report
            .weekly_completion_histogram
            .iter()
            .map(|(week, n)| format!("w{week}={n}"))
            .collect();
        println!("  completed by week: {}", weeks.join(" "));
    }
    println!();

    println!("tasks ({}):", rows.len());
    for row in rows {
        let marker = if row.critical { "*" } else { " " };
        let overdue = if row.schedule.is_overdue { "  OVERDUE" } else { "" };
        println!(
            " {marker} {:>4}  {:<28} {} +{:<3}d  -> {}  {:>3}%  left {:>4}d{overdue}",
            row.id,
            row.name,
            row.start_date,
            row.duration,
            row.schedule.end_date,
            row.progress,
            row.schedule.days_left,
        );
    }
}

/// Dry-run output: print the task tree without analysis.
fn print_dry_run(file: &ProjectFile) -> Result<()> {
    let graph = TaskGraph::from_tasks(file.tasks.iter().cloned())?;

    println!("taskplan dry-run");
    println!("  project.id = {:?}", file.project.id);
    println!("  policy.completion_lock = {:?}", file.policy.completion_lock);
    println!("  policy.derive_task_cost = {}", file.policy.derive_task_cost);
    println!("  resources = {}", file.resources.len());
    println!();

    println!("tasks ({}):", graph.len());
    print_subtree(&graph, None, 1);

    debug!("dry-run complete (no analysis)");
    Ok(())
}

fn print_subtree(graph: &TaskGraph, parent: Option<u64>, depth: usize) {
    for task in graph.children_of(parent) {
        let indent = "  ".repeat(depth);
        let deps: Vec<String> = task.dependency.iter().map(|d| d.to_string()).collect();
        if deps.is_empty() {
            println!("{indent}- [{}] {}", task.id, task.name);
        } else {
            println!("{indent}- [{}] {}  after {}", task.id, task.name, deps.join(","));
        }
        print_subtree(graph, Some(task.id), depth + 1);
    }
}
