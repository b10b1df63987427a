// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::warn;

use crate::errors::{PlanError, Result};
use crate::model::{Dependency, Task, TaskId};
use crate::reorder::ReorderPlan;

/// In-memory task set for one project, keyed by task id.
///
/// Two relations live on top of the records:
/// - the summary tree, through `parent_id` + `order`
/// - the dependency graph, through each task's `dependency` list
///
/// Child and successor lookups are derived by scanning; every structural
/// operation is a single pass over the set anyway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a task list, rejecting duplicate ids.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Result<Self> {
        let mut graph = Self::new();
        for task in tasks {
            if graph.tasks.contains_key(&task.id) {
                return Err(PlanError::InvalidGraph(format!(
                    "duplicate task id {}",
                    task.id
                )));
            }
            graph.tasks.insert(task.id, task);
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Like [`get`](Self::get) but with a `TaskNotFound` error.
    pub fn require(&self, id: TaskId) -> Result<&Task> {
        self.tasks.get(&id).ok_or(PlanError::TaskNotFound(id))
    }

    pub(crate) fn require_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks.get_mut(&id).ok_or(PlanError::TaskNotFound(id))
    }

    /// All tasks in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    pub fn max_id(&self) -> Option<TaskId> {
        self.tasks.keys().next_back().copied()
    }

    pub(crate) fn insert(&mut self, task: Task) {
        self.tasks.insert(task.id, task);
    }

    pub(crate) fn remove(&mut self, id: TaskId) -> Option<Task> {
        self.tasks.remove(&id)
    }

    /// Direct children of `parent` (`None` = top level), sorted by
    /// `(order, id)`.
    pub fn children_of(&self, parent: Option<TaskId>) -> Vec<&Task> {
        let mut children: Vec<&Task> = self
            .tasks
            .values()
            .filter(|t| t.parent_id == parent)
            .collect();
        children.sort_by_key(|t| (t.order, t.id));
        children
    }

    /// Sibling groups keyed by parent, each sorted by `(order, id)`.
    pub fn sibling_groups(&self) -> BTreeMap<Option<TaskId>, Vec<TaskId>> {
        let mut groups: BTreeMap<Option<TaskId>, Vec<(u32, TaskId)>> = BTreeMap::new();
        for t in self.tasks.values() {
            groups.entry(t.parent_id).or_default().push((t.order, t.id));
        }
        groups
            .into_iter()
            .map(|(parent, mut members)| {
                members.sort_unstable();
                (parent, members.into_iter().map(|(_, id)| id).collect())
            })
            .collect()
    }

    /// True when every sibling group holds exactly the orders `0..n`.
    pub fn orders_are_contiguous(&self) -> bool {
        self.sibling_groups().values().all(|ids| {
            ids.iter()
                .enumerate()
                .all(|(i, id)| self.tasks[id].order as usize == i)
        })
    }

    /// Every task below `root` in the summary tree (excluding `root`).
    pub fn descendants_of(&self, root: TaskId) -> BTreeSet<TaskId> {
        let groups = self.sibling_groups();
        let mut out = BTreeSet::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if let Some(children) = groups.get(&Some(id)) {
                for &c in children {
                    if out.insert(c) {
                        stack.push(c);
                    }
                }
            }
        }

        out
    }

    /// Parent chain of `id`, nearest first. Stops at a repeated id, so a
    /// corrupted parent cycle cannot loop forever.
    pub fn ancestors_of(&self, id: TaskId) -> Vec<TaskId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.tasks.get(&id).and_then(|t| t.parent_id);

        while let Some(p) = current {
            if !seen.insert(p) {
                warn!(task = id, parent = p, "parent chain loops back on itself");
                break;
            }
            chain.push(p);
            current = self.tasks.get(&p).and_then(|t| t.parent_id);
        }

        chain
    }

    /// Whether `candidate` sits somewhere below `ancestor`.
    pub fn is_descendant(&self, candidate: TaskId, ancestor: TaskId) -> bool {
        self.ancestors_of(candidate).contains(&ancestor)
    }

    /// Tasks that list `id` as a predecessor, in id order.
    pub fn dependents_of(&self, id: TaskId) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.depends_on(id))
            .map(|t| t.id)
            .collect()
    }

    /// Tasks with an assignment for the given resource id.
    pub fn tasks_assigned_to<'a>(&'a self, resource_id: &'a str) -> impl Iterator<Item = &'a Task> {
        self.tasks
            .values()
            .filter(move |t| t.assigned_resource.iter().any(|r| r.id == resource_id))
    }

    /// Tasks with at least one assignee from the given team.
    pub fn tasks_for_team<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a Task> {
        self.tasks.values().filter(move |t| {
            t.assigned_resource
                .iter()
                .any(|r| r.team_name.as_deref() == Some(team))
        })
    }

    /// Check the summary tree: parents exist, no self-parent, no cycles.
    pub fn validate_parents(&self) -> Result<()> {
        for t in self.tasks.values() {
            let Some(p) = t.parent_id else { continue };
            if p == t.id {
                return Err(PlanError::InvalidGraph(format!(
                    "task {} cannot be its own parent",
                    t.id
                )));
            }
            if !self.tasks.contains_key(&p) {
                return Err(PlanError::InvalidGraph(format!(
                    "task {} has unknown parent {}",
                    t.id, p
                )));
            }
        }

        for &id in self.tasks.keys() {
            let mut seen = HashSet::from([id]);
            let mut current = self.tasks[&id].parent_id;
            while let Some(p) = current {
                if !seen.insert(p) {
                    return Err(PlanError::InvalidGraph(format!(
                        "parent cycle detected involving task {id}"
                    )));
                }
                current = self.tasks.get(&p).and_then(|t| t.parent_id);
            }
        }

        Ok(())
    }

    /// Check predecessor references: no self-reference, no unknown ids.
    pub fn validate_dependencies(&self) -> Result<()> {
        for t in self.tasks.values() {
            self.validate_dependency_list(t.id, &t.dependency)?;
        }
        Ok(())
    }

    pub(crate) fn validate_dependency_list(&self, id: TaskId, deps: &[Dependency]) -> Result<()> {
        for dep in deps {
            if dep.predecessor == id {
                return Err(PlanError::InvalidGraph(format!(
                    "task {id} cannot depend on itself"
                )));
            }
            if !self.tasks.contains_key(&dep.predecessor) {
                return Err(PlanError::TaskNotFound(dep.predecessor));
            }
        }
        Ok(())
    }

    /// Write the planned `order` / `parent_id` values into the records.
    pub(crate) fn apply_plan(&mut self, plan: &ReorderPlan) -> Result<()> {
        for write in plan.iter() {
            let task = self.require_mut(write.task_id)?;
            task.order = write.new_order;
            task.parent_id = write.new_parent_id;
        }
        Ok(())
    }
}
