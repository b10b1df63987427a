// src/reorder.rs

//! Planning of `order` / `parent_id` writes for structural edits.
//!
//! Planners never touch the graph; they return the minimal list of writes
//! that keeps every sibling group numbered `0..n`. The engine applies a plan
//! to a working copy and commits only when the whole operation succeeds.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::trace;

use crate::dag::TaskGraph;
use crate::errors::{PlanError, Result};
use crate::model::TaskId;

/// One record write produced by a planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedWrite {
    pub task_id: TaskId,
    pub new_order: u32,
    pub new_parent_id: Option<TaskId>,
}

/// Writes needed for one structural change. Unchanged tasks are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReorderPlan {
    writes: Vec<PlannedWrite>,
}

impl ReorderPlan {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedWrite> {
        self.writes.iter()
    }

    pub fn writes(&self) -> &[PlannedWrite] {
        &self.writes
    }

    pub fn write_for(&self, id: TaskId) -> Option<&PlannedWrite> {
        self.writes.iter().find(|w| w.task_id == id)
    }

    pub fn task_ids(&self) -> BTreeSet<TaskId> {
        self.writes.iter().map(|w| w.task_id).collect()
    }

    /// Append the writes of `other`. Later writes for the same task win.
    pub fn extend(&mut self, other: ReorderPlan) {
        for w in other.writes {
            self.writes.retain(|existing| existing.task_id != w.task_id);
            self.writes.push(w);
        }
    }

    pub(crate) fn push(&mut self, write: PlannedWrite) {
        self.writes.retain(|w| w.task_id != write.task_id);
        self.writes.push(write);
    }

    fn set(&mut self, graph: &TaskGraph, task_id: TaskId, order: u32, parent: Option<TaskId>) {
        let unchanged = graph
            .get(task_id)
            .is_some_and(|t| t.order == order && t.parent_id == parent);
        if !unchanged {
            self.writes.retain(|w| w.task_id != task_id);
            self.writes.push(PlannedWrite {
                task_id,
                new_order: order,
                new_parent_id: parent,
            });
        }
    }

    /// Number `ids` as `0..n` under `parent`.
    fn lay_out(&mut self, graph: &TaskGraph, parent: Option<TaskId>, ids: &[TaskId]) {
        for (i, &id) in ids.iter().enumerate() {
            self.set(graph, id, i as u32, parent);
        }
    }
}

/// Where a new task goes and what has to shift to make room for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPlan {
    pub parent_id: Option<TaskId>,
    pub order: u32,
    pub plan: ReorderPlan,
}

/// Tasks removed by a delete (the target and its subtree) plus the writes
/// that close the gap it leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    pub removed: BTreeSet<TaskId>,
    pub plan: ReorderPlan,
}

fn sibling_ids(graph: &TaskGraph, parent: Option<TaskId>) -> Vec<TaskId> {
    graph.children_of(parent).iter().map(|t| t.id).collect()
}

fn ensure_parent(graph: &TaskGraph, parent: Option<TaskId>) -> Result<()> {
    match parent {
        Some(p) => graph.require(p).map(|_| ()),
        None => Ok(()),
    }
}

/// Make room for a new child of `parent` at `position` (appended when
/// `None` or past the end). Siblings at or after the position shift by one.
pub fn plan_insert(
    graph: &TaskGraph,
    parent: Option<TaskId>,
    position: Option<u32>,
) -> Result<InsertPlan> {
    ensure_parent(graph, parent)?;

    let siblings = sibling_ids(graph, parent);
    let n = siblings.len();
    let at = position.map_or(n, |p| (p as usize).min(n));

    let mut plan = ReorderPlan::default();
    for (i, &id) in siblings.iter().enumerate() {
        let slot = if i < at { i } else { i + 1 };
        plan.set(graph, id, slot as u32, parent);
    }

    trace!(?parent, order = at, writes = plan.len(), "planned insert");

    Ok(InsertPlan {
        parent_id: parent,
        order: at as u32,
        plan,
    })
}

/// Remove `id` with its whole subtree and compact the siblings left behind.
pub fn plan_delete(graph: &TaskGraph, id: TaskId) -> Result<DeletePlan> {
    let task = graph.require(id)?;
    let parent = task.parent_id;

    let mut removed = graph.descendants_of(id);
    removed.insert(id);

    let remaining: Vec<TaskId> = sibling_ids(graph, parent)
        .into_iter()
        .filter(|s| *s != id)
        .collect();

    let mut plan = ReorderPlan::default();
    plan.lay_out(graph, parent, &remaining);

    trace!(task = id, removed = removed.len(), writes = plan.len(), "planned delete");

    Ok(DeletePlan { removed, plan })
}

/// Drag `id` to `position` within its current sibling group.
pub fn plan_move(graph: &TaskGraph, id: TaskId, position: u32) -> Result<ReorderPlan> {
    let parent = graph.require(id)?.parent_id;

    let mut siblings: Vec<TaskId> = sibling_ids(graph, parent)
        .into_iter()
        .filter(|s| *s != id)
        .collect();
    let at = (position as usize).min(siblings.len());
    siblings.insert(at, id);

    let mut plan = ReorderPlan::default();
    plan.lay_out(graph, parent, &siblings);
    Ok(plan)
}

/// Move `id` under `new_parent`, appended after its existing children.
/// Moving to the current parent is a no-op.
pub fn plan_reparent(
    graph: &TaskGraph,
    id: TaskId,
    new_parent: Option<TaskId>,
) -> Result<ReorderPlan> {
    let old_parent = graph.require(id)?.parent_id;

    if let Some(p) = new_parent {
        if p == id {
            return Err(PlanError::InvalidGraph(format!(
                "task {id} cannot be its own parent"
            )));
        }
        graph.require(p)?;
        if graph.is_descendant(p, id) {
            return Err(PlanError::InvalidGraph(format!(
                "task {id} cannot move under its own descendant {p}"
            )));
        }
    }

    if new_parent == old_parent {
        return Ok(ReorderPlan::default());
    }

    let new_order = graph
        .children_of(new_parent)
        .iter()
        .map(|t| t.order + 1)
        .max()
        .unwrap_or(0);

    let former: Vec<TaskId> = sibling_ids(graph, old_parent)
        .into_iter()
        .filter(|s| *s != id)
        .collect();

    let mut plan = ReorderPlan::default();
    plan.lay_out(graph, old_parent, &former);
    plan.set(graph, id, new_order, new_parent);

    trace!(task = id, ?old_parent, ?new_parent, new_order, "planned reparent");

    Ok(plan)
}

/// Make `id` the last child of the sibling directly above it.
pub fn plan_indent(graph: &TaskGraph, id: TaskId) -> Result<ReorderPlan> {
    let parent = graph.require(id)?.parent_id;
    let siblings = sibling_ids(graph, parent);

    let above = siblings
        .iter()
        .position(|s| *s == id)
        .and_then(|i| i.checked_sub(1))
        .map(|i| siblings[i])
        .ok_or_else(|| {
            PlanError::InvalidGraph(format!("task {id} has no sibling above it to indent under"))
        })?;

    plan_reparent(graph, id, Some(above))
}

/// Move `id` up one level, to the end of its grandparent's children.
pub fn plan_outdent(graph: &TaskGraph, id: TaskId) -> Result<ReorderPlan> {
    let parent = graph
        .require(id)?
        .parent_id
        .ok_or_else(|| PlanError::InvalidGraph(format!("task {id} is already at the top level")))?;

    let grandparent = graph.require(parent)?.parent_id;
    plan_reparent(graph, id, grandparent)
}

/// Renumber every sibling group to `0..n`, keeping the current relative
/// order (ties broken by id).
pub fn plan_normalize(graph: &TaskGraph) -> ReorderPlan {
    let mut plan = ReorderPlan::default();
    for (parent, ids) in graph.sibling_groups() {
        plan.lay_out(graph, parent, &ids);
    }
    plan
}
