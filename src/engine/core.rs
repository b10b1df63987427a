// src/engine/core.rs

//! Pure per-project core.
//!
//! [`ProjectCore`] owns one project's snapshot and applies [`Command`]s to
//! it synchronously. It has no channels, no Tokio types and never reads a
//! clock: `now` always comes from the caller. The async shell in
//! `engine::runtime` wraps it to serialize access.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::aggregate::{AggregateReport, aggregate};
use crate::config::ProjectFile;
use crate::dag::{CriticalPathResult, TaskGraph, analyze, check_acyclic};
use crate::engine::handlers::{handle_command, validate_new_task};
use crate::engine::{Command, CoreStep, DomainEvent, Staleness};
use crate::errors::{PlanError, Result};
use crate::model::{NewTask, OtherResource, Project, Task, TaskId};
use crate::reorder::plan_normalize;
use crate::schedule::{ScheduleResult, schedule, schedule_all};
use crate::types::Policy;

/// Consistent view of one project at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub tasks: TaskGraph,
    pub resources: Vec<OtherResource>,
    /// Last successful analysis. Kept as is when a later one fails.
    pub critical_path: Option<CriticalPathResult>,
    /// Derived results invalidated since they were last recomputed.
    pub stale: Staleness,
}

impl ProjectSnapshot {
    pub fn report(&self, now: NaiveDateTime) -> AggregateReport {
        aggregate(
            self.tasks.tasks(),
            &self.resources,
            self.project.budget,
            now,
        )
    }

    pub fn schedule(&self, task_id: TaskId, now: NaiveDateTime) -> Result<ScheduleResult> {
        Ok(schedule(self.tasks.require(task_id)?, now))
    }

    pub fn schedules(&self, now: NaiveDateTime) -> Vec<ScheduleResult> {
        schedule_all(self.tasks.tasks(), now)
    }

    /// Whether the last analysis put `task_id` on the critical path.
    pub fn is_critical(&self, task_id: TaskId) -> bool {
        self.critical_path
            .as_ref()
            .is_some_and(|cp| cp.is_critical(task_id))
    }

    /// Tasks assigned to one member, in id order.
    pub fn tasks_for_member<'a>(&'a self, resource_id: &'a str) -> Vec<&'a Task> {
        self.tasks.tasks_assigned_to(resource_id).collect()
    }

    /// Tasks with an assignee from `team`, in id order.
    pub fn tasks_for_team<'a>(&'a self, team: &'a str) -> Vec<&'a Task> {
        self.tasks.tasks_for_team(team).collect()
    }
}

#[derive(Debug)]
pub struct ProjectCore {
    state: ProjectSnapshot,
    policy: Policy,
}

impl ProjectCore {
    /// Build a core from loaded records.
    ///
    /// The summary tree and dependency references must be valid. Two
    /// recoverable defects are repaired with a warning: sibling orders that
    /// are not `0..n`, and a task index not past the highest task id.
    pub fn new(
        mut project: Project,
        tasks: TaskGraph,
        resources: Vec<OtherResource>,
        policy: Policy,
    ) -> Result<Self> {
        tasks.validate_parents()?;
        tasks.validate_dependencies()?;

        let mut tasks = tasks;
        let repair = plan_normalize(&tasks);
        if !repair.is_empty() {
            warn!(
                project = %project.id,
                writes = repair.len(),
                "sibling orders were not contiguous; renumbering"
            );
            tasks.apply_plan(&repair)?;
        }

        if let Some(max_id) = tasks.max_id() {
            if project.task_index <= max_id {
                warn!(
                    project = %project.id,
                    task_index = project.task_index,
                    max_id,
                    "task index behind existing ids; advancing"
                );
                project.task_index = max_id + 1;
            }
        }

        debug!(
            project = %project.id,
            tasks = tasks.len(),
            resources = resources.len(),
            "project core created"
        );

        Ok(Self {
            state: ProjectSnapshot {
                project,
                tasks,
                resources,
                critical_path: None,
                stale: Staleness::all(),
            },
            policy,
        })
    }

    pub fn from_file(file: ProjectFile) -> Result<Self> {
        let ProjectFile {
            project,
            policy,
            tasks,
            resources,
        } = file;
        Self::new(project, TaskGraph::from_tasks(tasks)?, resources, policy)
    }

    /// Create a project from template drafts.
    ///
    /// Drafts become top-level tasks in the given order. A draft's
    /// dependencies name other drafts by their 0-based position in the list.
    /// The expected end date is `today` plus the summed durations.
    pub fn from_template(
        mut project: Project,
        drafts: Vec<NewTask>,
        today: NaiveDate,
        policy: Policy,
    ) -> Result<Self> {
        let base = project.task_index;
        let ids: HashMap<TaskId, TaskId> = (0..drafts.len() as TaskId)
            .map(|pos| (pos, base + pos))
            .collect();

        let total_days: u64 = drafts.iter().map(|d| u64::from(d.duration)).sum();

        let mut tasks = Vec::with_capacity(drafts.len());
        for (pos, mut draft) in drafts.into_iter().enumerate() {
            for dep in &mut draft.dependency {
                dep.predecessor = *ids
                    .get(&dep.predecessor)
                    .ok_or(PlanError::TaskNotFound(dep.predecessor))?;
            }
            let id = project.allocate_task_id();
            let task = draft.into_task(id, None, pos as u32);
            validate_new_task(&task, &policy)?;
            tasks.push(task);
        }

        project.expected_end_date = Some(
            today
                .checked_add_days(Days::new(total_days))
                .ok_or_else(|| {
                    PlanError::InvalidGraph("template end date is out of range".to_string())
                })?,
        );

        let graph = TaskGraph::from_tasks(tasks)?;
        check_acyclic(&graph)?;

        info!(
            project = %project.id,
            tasks = graph.len(),
            expected_end = ?project.expected_end_date,
            "project created from template"
        );

        Self::new(project, graph, Vec::new(), policy)
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.state
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn project_id(&self) -> &str {
        &self.state.project.id
    }

    /// Apply one command atomically: on error the snapshot is unchanged.
    pub fn apply(&mut self, command: Command) -> Result<CoreStep> {
        let name = command.name();
        let mut working = self.state.clone();

        match handle_command(&mut working, &self.policy, command) {
            Ok(step) => {
                working.stale.merge(step.stale);
                self.state = working;
                debug!(
                    project = %self.state.project.id,
                    command = name,
                    created = step.created.len(),
                    removed = step.removed.len(),
                    writes = step.plan.len(),
                    "command applied"
                );
                Ok(step)
            }
            Err(err) => {
                debug!(
                    project = %self.state.project.id,
                    command = name,
                    error = %err,
                    "command rejected"
                );
                Err(err)
            }
        }
    }

    /// Re-run the critical path analysis and store the result.
    ///
    /// Returns `CriticalPathChanged` when the length moved. On error (e.g.
    /// a cycle) the previous result and project field stay as they were.
    pub fn recompute_critical_path(&mut self) -> Result<Option<DomainEvent>> {
        let result = match analyze(&self.state.tasks) {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    project = %self.state.project.id,
                    error = %err,
                    "critical path analysis failed; keeping previous result"
                );
                return Err(err);
            }
        };

        let previous = self.state.project.critical_path_days;
        let length = result.length_days;

        self.state.project.critical_path_days = length;
        self.state.critical_path = Some(result);
        self.state.stale.critical_path = false;

        if previous == length {
            return Ok(None);
        }

        info!(
            project = %self.state.project.id,
            previous,
            length,
            "critical path length changed"
        );
        Ok(Some(DomainEvent::CriticalPathChanged {
            new_length_days: length,
        }))
    }

    /// Compute the aggregate report and write project progress back.
    pub fn refresh_rollups(&mut self, now: NaiveDateTime) -> AggregateReport {
        let report = self.state.report(now);
        self.state.project.progress = report.overall_progress.unwrap_or(0.0);
        self.state.stale.rollups = false;
        self.state.stale.schedules = false;
        report
    }
}
