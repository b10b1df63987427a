// src/dag/critical_path.rs

//! Forward/backward pass over the dependency graph.
//!
//! Times are day offsets from the earliest start date in the graph, so all
//! arithmetic stays in `i64` and dates are only rebuilt at the end.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Days, NaiveDate};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use tracing::debug;

use crate::dag::TaskGraph;
use crate::errors::{PlanError, Result};
use crate::model::{Task, TaskId};
use crate::types::DependencyKind;

/// Earliest/latest window of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTiming {
    pub earliest_start: NaiveDate,
    pub earliest_finish: NaiveDate,
    pub latest_start: NaiveDate,
    pub latest_finish: NaiveDate,
    /// Days the task can slip without moving the project finish.
    pub total_float: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalPathResult {
    pub length_days: i64,
    /// Every task with zero float that finishes by the last work finish.
    /// Parallel critical chains are all kept.
    pub critical_task_ids: BTreeSet<TaskId>,
    pub timings: BTreeMap<TaskId, TaskTiming>,
    pub project_start: Option<NaiveDate>,
    pub project_finish: Option<NaiveDate>,
}

impl CriticalPathResult {
    pub fn is_critical(&self, id: TaskId) -> bool {
        self.critical_task_ids.contains(&id)
    }
}

/// Edge direction: predecessor -> successor.
fn dependency_graph(graph: &TaskGraph) -> DiGraphMap<TaskId, ()> {
    let mut g: DiGraphMap<TaskId, ()> = DiGraphMap::new();

    for id in graph.ids() {
        g.add_node(id);
    }
    for task in graph.tasks() {
        for dep in &task.dependency {
            g.add_edge(dep.predecessor, task.id, ());
        }
    }

    g
}

/// Topological order of the dependency graph, or `CyclicDependency`.
pub fn check_acyclic(graph: &TaskGraph) -> Result<Vec<TaskId>> {
    graph.validate_dependencies()?;

    toposort(&dependency_graph(graph), None).map_err(|cycle| PlanError::CyclicDependency {
        task: cycle.node_id(),
    })
}

/// Run the critical path analysis over the whole task set.
///
/// A task with predecessors is placed by its constraints alone; its own
/// `start_date` is only the basis when it has none.
pub fn analyze(graph: &TaskGraph) -> Result<CriticalPathResult> {
    let order = check_acyclic(graph)?;

    let Some(base) = graph.tasks().map(|t| t.start_date).min() else {
        return Ok(CriticalPathResult::default());
    };

    let offset = |t: &Task| (t.start_date - base).num_days();
    let dur = |id: TaskId| graph.get(id).map(|t| i64::from(t.duration)).unwrap_or(0);

    // Forward pass.
    let mut es: HashMap<TaskId, i64> = HashMap::with_capacity(order.len());
    for &id in &order {
        let task = graph.require(id)?;
        let d = i64::from(task.duration);

        let start = task
            .dependency
            .iter()
            .map(|dep| {
                let p_es = es[&dep.predecessor];
                let p_ef = p_es + dur(dep.predecessor);
                let lag = i64::from(dep.lag);
                match dep.kind {
                    DependencyKind::FinishToStart => p_ef + lag,
                    DependencyKind::StartToStart => p_es + lag,
                    DependencyKind::FinishToFinish => p_ef + lag - d,
                    DependencyKind::StartToFinish => p_es + lag - d,
                }
            })
            .max()
            .unwrap_or_else(|| offset(task));

        es.insert(id, start);
    }

    let ef = |id: TaskId| es[&id] + dur(id);
    let work: Vec<&Task> = graph.tasks().filter(|t| !t.is_milestone()).collect();
    let finish = order.iter().map(|&id| ef(id)).max().unwrap_or(0);
    // The horizon is the last work finish. Milestones dated past it do not
    // pull their predecessors onto the critical path.
    let horizon = work.iter().map(|t| ef(t.id)).max().unwrap_or(finish);
    let beyond_horizon = |id: TaskId| ef(id) > horizon;

    // Backward pass. Constraints are collected from each successor onto its
    // predecessors, so walk the order in reverse.
    let mut lf: HashMap<TaskId, i64> = order
        .iter()
        .map(|&id| (id, horizon.max(ef(id))))
        .collect();
    for &id in order.iter().rev() {
        if beyond_horizon(id) {
            continue;
        }
        let task = graph.require(id)?;
        let s_lf = lf[&id];
        let s_ls = s_lf - i64::from(task.duration);

        for dep in &task.dependency {
            let p_dur = dur(dep.predecessor);
            let lag = i64::from(dep.lag);
            let bound = match dep.kind {
                DependencyKind::FinishToStart => s_ls - lag,
                DependencyKind::StartToStart => s_ls - lag + p_dur,
                DependencyKind::FinishToFinish => s_lf - lag,
                DependencyKind::StartToFinish => s_lf - lag + p_dur,
            };
            if let Some(slot) = lf.get_mut(&dep.predecessor) {
                *slot = (*slot).min(bound);
            }
        }
    }

    let to_date = |days: i64| -> Result<NaiveDate> {
        let shifted = if days >= 0 {
            base.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            base.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.ok_or_else(|| {
            PlanError::InvalidGraph(format!("schedule offset of {days} days is out of range"))
        })
    };

    let mut timings = BTreeMap::new();
    let mut critical_task_ids = BTreeSet::new();
    for &id in &order {
        let d = dur(id);
        let (s, f, l) = (es[&id], ef(id), lf[&id]);
        let total_float = l - f;

        if total_float <= 0 && !beyond_horizon(id) {
            critical_task_ids.insert(id);
        }

        timings.insert(
            id,
            TaskTiming {
                earliest_start: to_date(s)?,
                earliest_finish: to_date(f)?,
                latest_start: to_date(l - d)?,
                latest_finish: to_date(l)?,
                total_float,
            },
        );
    }

    let length_days = match (
        work.iter().map(|t| ef(t.id)).max(),
        work.iter().map(|t| offset(t)).min(),
    ) {
        (Some(finish), Some(start)) => (finish - start).max(0),
        _ => 0,
    };

    debug!(
        tasks = order.len(),
        length_days,
        critical = critical_task_ids.len(),
        "critical path analysed"
    );

    Ok(CriticalPathResult {
        length_days,
        critical_task_ids,
        timings,
        project_start: Some(base),
        project_finish: Some(to_date(finish)?),
    })
}
