// src/schedule.rs

//! Per-task temporal facts and field-update validation.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::errors::{PlanError, Result};
use crate::model::{FieldUpdate, MAX_DURATION_DAYS, Task, TaskId};
use crate::types::CompletionLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub task_id: TaskId,
    pub end_date: NaiveDate,
    /// Negative once the end date has passed.
    pub days_left: i64,
    pub is_overdue: bool,
}

/// `start_date + duration`. Milestones end on their start date.
pub fn end_date(task: &Task) -> NaiveDate {
    task.start_date
        .checked_add_days(Days::new(u64::from(task.duration)))
        .unwrap_or(NaiveDate::MAX)
}

pub fn days_left(task: &Task, now: NaiveDateTime) -> i64 {
    (end_date(task) - now.date()).num_days()
}

/// Past its end date and not complete. Never true for a milestone.
pub fn is_overdue(task: &Task, now: NaiveDateTime) -> bool {
    !task.is_milestone() && end_date(task).and_time(NaiveTime::MIN) < now && task.progress < 100
}

/// Whether `day` falls in `[start_date, end_date]`, both ends inclusive.
pub fn is_active_on(task: &Task, day: NaiveDate) -> bool {
    task.start_date <= day && day <= end_date(task)
}

pub fn schedule(task: &Task, now: NaiveDateTime) -> ScheduleResult {
    ScheduleResult {
        task_id: task.id,
        end_date: end_date(task),
        days_left: days_left(task, now),
        is_overdue: is_overdue(task, now),
    }
}

pub fn schedule_all<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    now: NaiveDateTime,
) -> Vec<ScheduleResult> {
    tasks.into_iter().map(|t| schedule(t, now)).collect()
}

/// Cost implied by the assignees' daily rates:
/// `sum(rate * duration * unit / 100)`. Assignees without a rate add nothing.
pub fn allocation_cost(task: &Task) -> f64 {
    let days = f64::from(task.duration);
    task.assigned_resource
        .iter()
        .filter_map(|r| r.daily_rate.map(|rate| rate * days * f64::from(r.unit) / 100.0))
        .sum()
}

/// Check one field update against value ranges and the completion lock.
///
/// Structural fields (`order`, `parent_id`) are only range-checked here;
/// tree consistency is the reorder planner's job.
pub fn validate_update(task: &Task, update: &FieldUpdate, lock: CompletionLock) -> Result<()> {
    if task.is_locked() && !update.allowed_when_locked() {
        return Err(PlanError::invalid_transition(
            task.id,
            format!("'{}' cannot change on a completed task", update.field_name()),
        ));
    }

    match update {
        FieldUpdate::Name(name) => {
            if name.trim().is_empty() {
                return Err(PlanError::InvalidGraph(format!(
                    "task {} name cannot be empty",
                    task.id
                )));
            }
        }
        FieldUpdate::Duration(days) => {
            if !(0..=MAX_DURATION_DAYS).contains(days) {
                return Err(PlanError::InvalidGraph(format!(
                    "task {} duration must be within 0..={MAX_DURATION_DAYS} days (got {days})",
                    task.id
                )));
            }
        }
        FieldUpdate::StartDate(date) => {
            if date.checked_add_days(Days::new(MAX_DURATION_DAYS as u64)).is_none() {
                return Err(PlanError::InvalidGraph(format!(
                    "task {} start date {date} is out of range",
                    task.id
                )));
            }
        }
        FieldUpdate::Progress(p) => {
            if !(0..=100).contains(p) {
                return Err(PlanError::InvalidGraph(format!(
                    "task {} progress must be within 0..=100 (got {p})",
                    task.id
                )));
            }
            if task.is_locked() && *p < 100 && lock == CompletionLock::OneWay {
                return Err(PlanError::invalid_transition(
                    task.id,
                    "progress cannot go back below 100 on a completed task",
                ));
            }
        }
        FieldUpdate::Dependency(deps) => {
            for dep in deps {
                if dep.predecessor == task.id {
                    return Err(PlanError::InvalidGraph(format!(
                        "task {} cannot depend on itself",
                        task.id
                    )));
                }
                if i64::from(dep.lag).abs() > MAX_DURATION_DAYS {
                    return Err(PlanError::InvalidGraph(format!(
                        "task {} lag on predecessor {} is out of range ({}d)",
                        task.id, dep.predecessor, dep.lag
                    )));
                }
            }
        }
        FieldUpdate::ParentId(Some(parent)) if *parent == task.id => {
            return Err(PlanError::InvalidGraph(format!(
                "task {} cannot be its own parent",
                task.id
            )));
        }
        FieldUpdate::AssignedResource(resources) => {
            for r in resources {
                if r.unit > 100 {
                    return Err(PlanError::InvalidGraph(format!(
                        "resource '{}' on task {} has allocation {}% (max 100)",
                        r.id, task.id, r.unit
                    )));
                }
                if r.daily_rate.is_some_and(|rate| !rate.is_finite() || rate < 0.0) {
                    return Err(PlanError::InvalidGraph(format!(
                        "resource '{}' on task {} has an invalid daily rate",
                        r.id, task.id
                    )));
                }
            }
        }
        FieldUpdate::TotalCost(cost) => {
            if !cost.is_finite() || *cost < 0.0 {
                return Err(PlanError::InvalidGraph(format!(
                    "task {} total cost must be a non-negative amount (got {cost})",
                    task.id
                )));
            }
        }
        FieldUpdate::Notes(_) | FieldUpdate::Order(_) | FieldUpdate::ParentId(_) => {}
    }

    Ok(())
}

/// Write a validated update into the record. Structural fields are left to
/// the caller.
pub(crate) fn apply_field(task: &mut Task, update: FieldUpdate) {
    match update {
        FieldUpdate::Name(name) => task.name = name,
        FieldUpdate::Notes(notes) => task.notes = notes,
        FieldUpdate::Duration(days) => task.duration = days as u32,
        FieldUpdate::StartDate(date) => task.start_date = date,
        FieldUpdate::Dependency(deps) => task.dependency = deps,
        FieldUpdate::Progress(p) => task.progress = p as u8,
        FieldUpdate::AssignedResource(resources) => task.assigned_resource = resources,
        FieldUpdate::TotalCost(cost) => task.total_cost = cost,
        FieldUpdate::Order(_) | FieldUpdate::ParentId(_) => {}
    }
}
