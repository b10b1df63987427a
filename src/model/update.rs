// src/model/update.rs

//! Typed field updates for a single task.

use chrono::NaiveDate;

use crate::model::{AssignedResource, Dependency, Task, TaskId};

/// One field-level edit of a task.
///
/// Numeric payloads are wide and signed so that out-of-range input reaches
/// validation instead of being silently truncated by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Name(String),
    Notes(Option<String>),
    Duration(i64),
    StartDate(NaiveDate),
    Dependency(Vec<Dependency>),
    Progress(i64),
    /// Drag within the current sibling group to this position.
    Order(u32),
    /// Move under another parent (or to the root with `None`).
    ParentId(Option<TaskId>),
    AssignedResource(Vec<AssignedResource>),
    TotalCost(f64),
}

impl FieldUpdate {
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldUpdate::Name(_) => "name",
            FieldUpdate::Notes(_) => "notes",
            FieldUpdate::Duration(_) => "duration",
            FieldUpdate::StartDate(_) => "startDate",
            FieldUpdate::Dependency(_) => "dependency",
            FieldUpdate::Progress(_) => "progress",
            FieldUpdate::Order(_) => "order",
            FieldUpdate::ParentId(_) => "parentId",
            FieldUpdate::AssignedResource(_) => "assignedResource",
            FieldUpdate::TotalCost(_) => "totalCost",
        }
    }

    /// Edits that stay allowed after a task has been completed.
    pub fn allowed_when_locked(&self) -> bool {
        matches!(
            self,
            FieldUpdate::Name(_)
                | FieldUpdate::Notes(_)
                | FieldUpdate::TotalCost(_)
                | FieldUpdate::Order(_)
                | FieldUpdate::ParentId(_)
                | FieldUpdate::Progress(_)
        )
    }
}

/// Field updates that turn `before` into `after`, in declaration order.
///
/// `id` is not compared. Structural fields (`order`, `parent_id`) are
/// reported like any other field; the engine routes them to the reorder
/// planner.
pub fn diff_fields(before: &Task, after: &Task) -> Vec<FieldUpdate> {
    let mut changes = Vec::new();

    if before.name != after.name {
        changes.push(FieldUpdate::Name(after.name.clone()));
    }
    if before.notes != after.notes {
        changes.push(FieldUpdate::Notes(after.notes.clone()));
    }
    if before.duration != after.duration {
        changes.push(FieldUpdate::Duration(i64::from(after.duration)));
    }
    if before.start_date != after.start_date {
        changes.push(FieldUpdate::StartDate(after.start_date));
    }
    if before.dependency != after.dependency {
        changes.push(FieldUpdate::Dependency(after.dependency.clone()));
    }
    if before.progress != after.progress {
        changes.push(FieldUpdate::Progress(i64::from(after.progress)));
    }
    if before.parent_id != after.parent_id {
        changes.push(FieldUpdate::ParentId(after.parent_id));
    }
    if before.order != after.order {
        changes.push(FieldUpdate::Order(after.order));
    }
    if before.assigned_resource != after.assigned_resource {
        changes.push(FieldUpdate::AssignedResource(after.assigned_resource.clone()));
    }
    if before.total_cost != after.total_cost {
        changes.push(FieldUpdate::TotalCost(after.total_cost));
    }

    changes
}
