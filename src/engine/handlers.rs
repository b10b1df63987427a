// src/engine/handlers.rs

//! Command handlers for the project core.
//!
//! Handlers mutate the working snapshot they are given and may fail
//! halfway through; the core only commits the snapshot on success.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::dag::check_acyclic;
use crate::engine::core::ProjectSnapshot;
use crate::engine::{Command, CoreStep, DomainEvent, Staleness};
use crate::errors::{PlanError, Result};
use crate::model::{FieldUpdate, NewTask, OtherResource, ProjectUpdate, Task, TaskId};
use crate::reorder::{
    PlannedWrite, ReorderPlan, plan_delete, plan_indent, plan_insert, plan_move, plan_outdent,
    plan_reparent,
};
use crate::schedule::{allocation_cost, apply_field, validate_update};
use crate::types::Policy;

pub(crate) fn handle_command(
    state: &mut ProjectSnapshot,
    policy: &Policy,
    command: Command,
) -> Result<CoreStep> {
    match command {
        Command::AddTask {
            parent_id,
            position,
            task,
        } => handle_add_task(state, policy, parent_id, position, task),
        Command::ImportTasks { parent_id, tasks } => {
            let mut step = CoreStep::default();
            for task in tasks {
                let added = handle_add_task(state, policy, parent_id, None, task)?;
                merge_steps(&mut step, added);
            }
            Ok(step)
        }
        Command::DeleteTask { task_id } => handle_delete_task(state, task_id),
        Command::UpdateTask { task_id, update } => {
            handle_update_fields(state, policy, task_id, vec![update])
        }
        Command::UpdateTaskFields { task_id, updates } => {
            handle_update_fields(state, policy, task_id, updates)
        }
        Command::MoveTask { task_id, position } => {
            let plan = plan_move(&state.tasks, task_id, position)?;
            handle_structural(state, plan)
        }
        Command::Reparent { task_id, parent_id } => {
            let plan = plan_reparent(&state.tasks, task_id, parent_id)?;
            handle_structural(state, plan)
        }
        Command::Indent { task_id } => {
            let plan = plan_indent(&state.tasks, task_id)?;
            handle_structural(state, plan)
        }
        Command::Outdent { task_id } => {
            let plan = plan_outdent(&state.tasks, task_id)?;
            handle_structural(state, plan)
        }
        Command::UpsertResource(resource) => handle_upsert_resource(state, resource),
        Command::RemoveResource { resource_id } => handle_remove_resource(state, &resource_id),
        Command::UpdateProject(update) => handle_update_project(state, update),
    }
}

fn merge_steps(into: &mut CoreStep, from: CoreStep) {
    into.created.extend(from.created);
    into.removed.extend(from.removed);
    into.touched.extend(from.touched);
    into.plan.extend(from.plan);
    into.events.extend(from.events);
    into.stale.merge(from.stale);
}

/// Run the creation-time field checks on a fresh task record.
pub(crate) fn validate_new_task(task: &Task, policy: &Policy) -> Result<()> {
    let checks = [
        FieldUpdate::Name(task.name.clone()),
        FieldUpdate::Duration(i64::from(task.duration)),
        FieldUpdate::StartDate(task.start_date),
        FieldUpdate::Dependency(task.dependency.clone()),
    ];
    for update in &checks {
        validate_update(task, update, policy.completion_lock)?;
    }
    Ok(())
}

fn handle_add_task(
    state: &mut ProjectSnapshot,
    policy: &Policy,
    parent_id: Option<TaskId>,
    position: Option<u32>,
    new_task: NewTask,
) -> Result<CoreStep> {
    let insert = plan_insert(&state.tasks, parent_id, position)?;

    let id = state.project.allocate_task_id();
    if state.tasks.contains(id) {
        return Err(PlanError::InvalidGraph(format!(
            "task index {id} is already taken"
        )));
    }

    let task = new_task.into_task(id, insert.parent_id, insert.order);
    validate_new_task(&task, policy)?;
    state.tasks.validate_dependency_list(id, &task.dependency)?;

    state.tasks.apply_plan(&insert.plan)?;
    state.tasks.insert(task);

    let mut plan = insert.plan;
    plan.push(PlannedWrite {
        task_id: id,
        new_order: insert.order,
        new_parent_id: insert.parent_id,
    });

    debug!(task = id, ?parent_id, order = insert.order, "task added");

    Ok(CoreStep {
        created: vec![id],
        plan,
        stale: Staleness::all(),
        ..CoreStep::default()
    })
}

fn handle_delete_task(state: &mut ProjectSnapshot, task_id: TaskId) -> Result<CoreStep> {
    let delete = plan_delete(&state.tasks, task_id)?;

    // Target first, then its subtree in id order.
    let doomed = std::iter::once(task_id).chain(
        delete
            .removed
            .iter()
            .copied()
            .filter(|id| *id != task_id),
    );

    let mut events = Vec::new();
    for id in doomed.collect::<Vec<_>>() {
        if let Some(task) = state.tasks.remove(id) {
            let emails: BTreeSet<String> = task
                .assigned_resource
                .iter()
                .filter_map(|r| r.email.clone())
                .collect();
            events.push(DomainEvent::TaskDeleted {
                task_id: id,
                affected_resource_emails: emails.into_iter().collect(),
            });
        }
    }

    state.tasks.apply_plan(&delete.plan)?;

    // Survivors that still point at a removed task.
    let touched: BTreeSet<TaskId> = delete
        .removed
        .iter()
        .flat_map(|id| state.tasks.dependents_of(*id))
        .collect();
    for &id in &touched {
        state
            .tasks
            .require_mut(id)?
            .dependency
            .retain(|d| !delete.removed.contains(&d.predecessor));
    }

    info!(
        task = task_id,
        removed = delete.removed.len(),
        unlinked = touched.len(),
        "task deleted"
    );

    Ok(CoreStep {
        removed: delete.removed,
        touched,
        plan: delete.plan,
        events,
        stale: Staleness::all(),
        ..CoreStep::default()
    })
}

fn field_staleness(update: &FieldUpdate, recosted: bool) -> Staleness {
    match update {
        FieldUpdate::Duration(_) | FieldUpdate::StartDate(_) | FieldUpdate::Dependency(_) => {
            Staleness::all()
        }
        FieldUpdate::Progress(_) => Staleness {
            rollups: true,
            schedules: true,
            ..Staleness::default()
        },
        FieldUpdate::TotalCost(_) => Staleness {
            rollups: true,
            ..Staleness::default()
        },
        FieldUpdate::AssignedResource(_) => Staleness {
            rollups: recosted,
            ..Staleness::default()
        },
        FieldUpdate::Name(_)
        | FieldUpdate::Notes(_)
        | FieldUpdate::Order(_)
        | FieldUpdate::ParentId(_) => Staleness::default(),
    }
}

fn handle_update_fields(
    state: &mut ProjectSnapshot,
    policy: &Policy,
    task_id: TaskId,
    updates: Vec<FieldUpdate>,
) -> Result<CoreStep> {
    let mut step = CoreStep::default();

    for update in updates {
        let old_progress = {
            let current = state.tasks.require(task_id)?;
            validate_update(current, &update, policy.completion_lock)?;
            current.progress
        };

        match update {
            FieldUpdate::Order(position) => {
                let plan = plan_move(&state.tasks, task_id, position)?;
                state.tasks.apply_plan(&plan)?;
                step.plan.extend(plan);
            }
            FieldUpdate::ParentId(parent) => {
                let plan = plan_reparent(&state.tasks, task_id, parent)?;
                state.tasks.apply_plan(&plan)?;
                step.plan.extend(plan);
            }
            FieldUpdate::Dependency(deps) => {
                state.tasks.validate_dependency_list(task_id, &deps)?;
                state.tasks.require_mut(task_id)?.dependency = deps;
                check_acyclic(&state.tasks)?;
                step.touched.insert(task_id);
                step.stale.merge(Staleness::all());
            }
            other => {
                let recost = policy.derive_task_cost
                    && matches!(
                        other,
                        FieldUpdate::Duration(_) | FieldUpdate::AssignedResource(_)
                    );
                let stale = field_staleness(&other, recost);

                let task = state.tasks.require_mut(task_id)?;
                apply_field(task, other);
                if recost {
                    task.total_cost = allocation_cost(task);
                }
                if task.progress != old_progress {
                    step.events.push(DomainEvent::TaskProgressChanged {
                        task_id,
                        new_progress: task.progress,
                    });
                }

                step.touched.insert(task_id);
                step.stale.merge(stale);
            }
        }
    }

    debug!(task = task_id, writes = step.plan.len(), "task updated");
    Ok(step)
}

fn handle_structural(state: &mut ProjectSnapshot, plan: ReorderPlan) -> Result<CoreStep> {
    state.tasks.apply_plan(&plan)?;
    debug!(writes = plan.len(), "structural change applied");
    Ok(CoreStep {
        plan,
        ..CoreStep::default()
    })
}

fn validate_amount(what: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlanError::InvalidGraph(format!(
            "{what} must be a non-negative amount (got {value})"
        )));
    }
    Ok(())
}

fn handle_upsert_resource(state: &mut ProjectSnapshot, resource: OtherResource) -> Result<CoreStep> {
    if resource.id.trim().is_empty() {
        return Err(PlanError::InvalidGraph(
            "resource id cannot be empty".to_string(),
        ));
    }
    validate_amount("resource quantity", resource.quantity)?;
    validate_amount("resource price per quantity", resource.price_per_quantity)?;

    match state.resources.iter_mut().find(|r| r.id == resource.id) {
        Some(existing) => *existing = resource,
        None => state.resources.push(resource),
    }

    Ok(CoreStep {
        stale: Staleness {
            rollups: true,
            ..Staleness::default()
        },
        ..CoreStep::default()
    })
}

fn handle_remove_resource(state: &mut ProjectSnapshot, resource_id: &str) -> Result<CoreStep> {
    let index = state
        .resources
        .iter()
        .position(|r| r.id == resource_id)
        .ok_or_else(|| PlanError::ResourceNotFound(resource_id.to_string()))?;
    state.resources.remove(index);

    Ok(CoreStep {
        stale: Staleness {
            rollups: true,
            ..Staleness::default()
        },
        ..CoreStep::default()
    })
}

fn handle_update_project(state: &mut ProjectSnapshot, update: ProjectUpdate) -> Result<CoreStep> {
    let mut stale = Staleness::default();

    match update {
        ProjectUpdate::Name(name) => {
            if name.trim().is_empty() {
                return Err(PlanError::InvalidGraph(
                    "project name cannot be empty".to_string(),
                ));
            }
            state.project.name = name;
        }
        ProjectUpdate::Budget(budget) => {
            if let Some(b) = budget {
                validate_amount("project budget", b)?;
            }
            state.project.budget = budget;
            stale.rollups = true;
        }
        ProjectUpdate::Status(status) => state.project.status = status,
        ProjectUpdate::ExpectedEndDate(date) => state.project.expected_end_date = date,
    }

    Ok(CoreStep {
        stale,
        ..CoreStep::default()
    })
}
