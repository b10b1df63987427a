// src/engine/mod.rs

//! Per-project mutation engine.
//!
//! Every change to a project's task set goes through a [`Command`]:
//! - the pure core ([`core`]) applies it to a working copy of the project
//!   and commits only when every step succeeded
//! - the async shell ([`runtime`]) owns one core per project and serializes
//!   commands through a channel, publishing a fresh snapshot after each one
//! - [`registry`] keeps the open projects, one runtime each
//!
//! A command never recomputes anything by itself. It reports which derived
//! results went stale and the caller (or the runtime) decides when to
//! recompute.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{FieldUpdate, NewTask, OtherResource, ProjectUpdate, TaskId};

/// A single mutation request against one project.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a task under `parent_id` at sibling `position`
    /// (appended when `None`).
    AddTask {
        parent_id: Option<TaskId>,
        position: Option<u32>,
        task: NewTask,
    },
    /// Append several tasks under the same parent, in the given order.
    ImportTasks {
        parent_id: Option<TaskId>,
        tasks: Vec<NewTask>,
    },
    /// Delete a task and its whole subtree.
    DeleteTask { task_id: TaskId },
    UpdateTask {
        task_id: TaskId,
        update: FieldUpdate,
    },
    /// Several field edits of one task, applied in order as one unit.
    UpdateTaskFields {
        task_id: TaskId,
        updates: Vec<FieldUpdate>,
    },
    MoveTask { task_id: TaskId, position: u32 },
    Reparent {
        task_id: TaskId,
        parent_id: Option<TaskId>,
    },
    Indent { task_id: TaskId },
    Outdent { task_id: TaskId },
    UpsertResource(OtherResource),
    RemoveResource { resource_id: String },
    UpdateProject(ProjectUpdate),
}

impl Command {
    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddTask { .. } => "add_task",
            Command::ImportTasks { .. } => "import_tasks",
            Command::DeleteTask { .. } => "delete_task",
            Command::UpdateTask { .. } => "update_task",
            Command::UpdateTaskFields { .. } => "update_task_fields",
            Command::MoveTask { .. } => "move_task",
            Command::Reparent { .. } => "reparent",
            Command::Indent { .. } => "indent",
            Command::Outdent { .. } => "outdent",
            Command::UpsertResource(_) => "upsert_resource",
            Command::RemoveResource { .. } => "remove_resource",
            Command::UpdateProject(_) => "update_project",
        }
    }
}

/// Notifications for collaborators outside the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    #[serde(rename_all = "camelCase")]
    TaskDeleted {
        task_id: TaskId,
        affected_resource_emails: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    TaskProgressChanged { task_id: TaskId, new_progress: u8 },
    #[serde(rename_all = "camelCase")]
    CriticalPathChanged { new_length_days: i64 },
}

/// Derived results invalidated by a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Staleness {
    pub critical_path: bool,
    /// Aggregate report and project progress.
    pub rollups: bool,
    /// Per-task end dates, days left, overdue flags.
    pub schedules: bool,
}

impl Staleness {
    pub fn all() -> Self {
        Self {
            critical_path: true,
            rollups: true,
            schedules: true,
        }
    }

    pub fn any(&self) -> bool {
        self.critical_path || self.rollups || self.schedules
    }

    pub fn merge(&mut self, other: Staleness) {
        self.critical_path |= other.critical_path;
        self.rollups |= other.rollups;
        self.schedules |= other.schedules;
    }
}

/// Outcome of one applied command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreStep {
    /// Ids allocated for new tasks, in creation order.
    pub created: Vec<TaskId>,
    pub removed: BTreeSet<TaskId>,
    /// Tasks whose non-structural fields changed.
    pub touched: BTreeSet<TaskId>,
    /// `order` / `parent_id` writes, including those of created tasks.
    pub plan: crate::reorder::ReorderPlan,
    pub events: Vec<DomainEvent>,
    pub stale: Staleness,
}

/// Runtime options used by the async shell.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    /// Recompute the critical path right after any command that made it
    /// stale.
    pub recompute_critical_path: bool,
    /// Capacity of the per-project command channel.
    pub command_buffer: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            recompute_critical_path: true,
            command_buffer: 64,
        }
    }
}

pub mod core;
pub mod handlers;
pub mod registry;
pub mod runtime;

pub use core::{ProjectCore, ProjectSnapshot};
pub use registry::ProjectRegistry;
pub use runtime::{ProjectHandle, ProjectRuntime};
