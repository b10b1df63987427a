// src/aggregate.rs

//! Project-level rollups over a task set and its non-labor resources.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::{OtherResource, Task};
use crate::schedule::{end_date, is_active_on, is_overdue};
use crate::types::ResourceCategory;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    /// Mean progress of non-milestone tasks; `None` when there are none.
    pub overall_progress: Option<f64>,
    pub tasks_completed_rate: f64,
    pub overdue_rate: f64,
    pub active_tasks_today: usize,
    /// `task_cost + resource_cost`.
    pub actual_budget: f64,
    pub task_cost: f64,
    pub resource_cost: f64,
    pub resource_cost_by_category: BTreeMap<ResourceCategory, f64>,
    pub budget: Option<f64>,
    pub budget_exceeded: bool,
    /// `actual_budget / budget * 100` when a positive budget is set.
    pub budget_usage: Option<f64>,
    /// Completed tasks per week number, counted from `project_start`.
    pub weekly_completion_histogram: BTreeMap<u32, usize>,
    pub project_start: Option<NaiveDate>,
    pub project_end: Option<NaiveDate>,
    pub task_count: usize,
    pub milestone_count: usize,
}

/// Order-independent float sum.
fn stable_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Compute every rollup at once. `now` is supplied by the caller.
pub fn aggregate<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    resources: &[OtherResource],
    budget: Option<f64>,
    now: NaiveDateTime,
) -> AggregateReport {
    let all: Vec<&Task> = tasks.into_iter().collect();
    let work: Vec<&Task> = all.iter().copied().filter(|t| !t.is_milestone()).collect();
    let today = now.date();
    let n = work.len();

    let overall_progress = (n > 0).then(|| {
        let total: u64 = work.iter().map(|t| u64::from(t.progress)).sum();
        total as f64 / n as f64
    });

    let completed = work.iter().filter(|t| t.progress >= 100).count();
    let overdue = work.iter().filter(|t| is_overdue(t, now)).count();
    let active_tasks_today = work.iter().filter(|t| is_active_on(t, today)).count();

    let task_cost = stable_sum(work.iter().map(|t| t.total_cost).collect());
    let resource_cost = stable_sum(resources.iter().map(OtherResource::cost).collect());

    let mut by_category: BTreeMap<ResourceCategory, Vec<f64>> = BTreeMap::new();
    for r in resources {
        by_category.entry(r.category).or_default().push(r.cost());
    }
    let resource_cost_by_category = by_category
        .into_iter()
        .map(|(category, costs)| (category, stable_sum(costs)))
        .collect();

    let actual_budget = task_cost + resource_cost;
    let budget_exceeded = budget.is_some_and(|b| actual_budget > b);
    let budget_usage = budget
        .filter(|b| *b > 0.0)
        .map(|b| actual_budget / b * 100.0);

    // The span covers milestones too; only work is counted in the histogram.
    let project_start = all.iter().map(|t| t.start_date).min();
    let project_end = all.iter().map(|t| end_date(t)).max();

    let mut weekly_completion_histogram = BTreeMap::new();
    if let Some(start) = project_start {
        for t in work.iter().filter(|t| t.progress >= 100) {
            let week = (t.start_date - start).num_days().div_euclid(7) + 1;
            *weekly_completion_histogram.entry(week as u32).or_insert(0) += 1;
        }
    }

    AggregateReport {
        overall_progress,
        tasks_completed_rate: percent(completed, n),
        overdue_rate: percent(overdue, n),
        active_tasks_today,
        actual_budget,
        task_cost,
        resource_cost,
        resource_cost_by_category,
        budget,
        budget_exceeded,
        budget_usage,
        weekly_completion_histogram,
        project_start,
        project_end,
        task_count: n,
        milestone_count: all.len() - n,
    }
}
