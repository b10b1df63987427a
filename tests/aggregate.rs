// tests/aggregate.rs
mod common;
use crate::common::builders::{TaskBuilder, at, day, noon};
use crate::common::init_tracing;

use std::collections::BTreeMap;

use taskplan::aggregate::aggregate;
use taskplan::model::{OtherResource, Task};
use taskplan::types::ResourceCategory;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn mean_progress_and_completion_rate() {
    init_tracing();

    let tasks: Vec<Task> = (0..10)
        .map(|i| {
            let progress = if i < 3 { 100 } else { 50 };
            TaskBuilder::new(i, 0, 5).progress(progress).build()
        })
        .collect();

    let report = aggregate(&tasks, &[], None, at(1));

    assert_eq!(report.overall_progress, Some(65.0));
    assert!(close(report.tasks_completed_rate, 30.0));
    assert_eq!(report.task_count, 10);
}

#[test]
fn actual_budget_adds_task_and_resource_costs() {
    let tasks = vec![TaskBuilder::new(1, 0, 3).cost(1000.0).build()];
    let cement = OtherResource::new("cement", "Cement", ResourceCategory::Material, 2.0, 500.0);

    let report = aggregate(&tasks, &[cement], Some(1500.0), at(0));

    assert!(close(report.actual_budget, 2000.0));
    assert!(close(report.task_cost, 1000.0));
    assert!(close(report.resource_cost, 1000.0));
    assert!(report.budget_exceeded);
    let usage = report.budget_usage.expect("budget set");
    assert!((usage - 133.333).abs() < 0.001);
}

#[test]
fn budget_exceeded_only_when_budget_is_set() {
    let tasks = vec![TaskBuilder::new(1, 0, 3).cost(10.0).build()];

    let unset = aggregate(&tasks, &[], None, at(0));
    assert!(!unset.budget_exceeded);
    assert_eq!(unset.budget_usage, None);

    let enough = aggregate(&tasks, &[], Some(10.0), at(0));
    assert!(!enough.budget_exceeded);
}

#[test]
fn milestones_are_excluded_from_every_rollup() {
    let tasks = vec![
        TaskBuilder::new(1, 0, 4).progress(100).cost(100.0).build(),
        TaskBuilder::milestone(2, 0).cost(999.0).build(),
        TaskBuilder::milestone(3, 5).progress(100).build(),
    ];

    let report = aggregate(&tasks, &[], None, at(20));

    assert_eq!(report.overall_progress, Some(100.0));
    assert!(close(report.tasks_completed_rate, 100.0));
    assert!(close(report.overdue_rate, 0.0));
    assert_eq!(report.active_tasks_today, 0);
    assert!(close(report.task_cost, 100.0));
    assert_eq!(report.task_count, 1);
    assert_eq!(report.milestone_count, 2);
    assert_eq!(report.weekly_completion_histogram, BTreeMap::from([(1, 1)]));
}

#[test]
fn empty_project_reports_no_progress() {
    let report = aggregate(&[] as &[Task], &[], None, at(0));

    assert_eq!(report.overall_progress, None);
    assert!(close(report.tasks_completed_rate, 0.0));
    assert!(close(report.overdue_rate, 0.0));
    assert_eq!(report.project_start, None);
    assert!(report.weekly_completion_histogram.is_empty());
}

#[test]
fn overdue_and_active_counts_use_now() {
    let tasks = vec![
        TaskBuilder::new(1, 0, 2).progress(20).build(),
        TaskBuilder::new(2, 0, 2).progress(100).build(),
        TaskBuilder::new(3, 3, 4).build(),
        TaskBuilder::new(4, 6, 2).build(),
    ];

    let report = aggregate(&tasks, &[], None, noon(5));

    // Only task 1 is past its end while incomplete.
    assert!(close(report.overdue_rate, 25.0));
    // Day 5 lies in [3, 7] only.
    assert_eq!(report.active_tasks_today, 1);
    assert_eq!(report.project_start, Some(day(0)));
    assert_eq!(report.project_end, Some(day(8)));
}

#[test]
fn weekly_histogram_buckets_completed_tasks_by_start_week() {
    let tasks = vec![
        TaskBuilder::new(1, 0, 2).progress(100).build(),
        TaskBuilder::new(2, 3, 2).progress(100).build(),
        TaskBuilder::new(3, 7, 2).progress(100).build(),
        TaskBuilder::new(4, 15, 2).progress(50).build(),
        TaskBuilder::new(5, 20, 2).progress(100).build(),
    ];

    let report = aggregate(&tasks, &[], None, at(0));

    assert_eq!(
        report.weekly_completion_histogram,
        BTreeMap::from([(1, 2), (2, 1), (3, 1)])
    );
}

#[test]
fn resource_cost_is_split_by_category() {
    let resources = vec![
        OtherResource::new("cement", "Cement", ResourceCategory::Material, 2.0, 500.0),
        OtherResource::new("sand", "Sand", ResourceCategory::Material, 4.0, 25.0),
        OtherResource::new("mixer", "Mixer", ResourceCategory::Equipment, 1.0, 800.0),
    ];

    let report = aggregate(&[] as &[Task], &resources, None, at(0));

    assert!(close(report.resource_cost, 1900.0));
    assert!(close(
        report.resource_cost_by_category[&ResourceCategory::Material],
        1100.0
    ));
    assert!(close(
        report.resource_cost_by_category[&ResourceCategory::Equipment],
        800.0
    ));
    assert!(!report
        .resource_cost_by_category
        .contains_key(&ResourceCategory::Tool));
}

#[test]
fn totals_do_not_depend_on_input_order() {
    let tasks: Vec<Task> = [0.1, 1e9, 0.2, 3.3, 1e-7, 42.0]
        .iter()
        .enumerate()
        .map(|(i, cost)| TaskBuilder::new(i as u64, 0, 1).cost(*cost).build())
        .collect();
    let reversed: Vec<Task> = tasks.iter().rev().cloned().collect();

    let a = aggregate(&tasks, &[], None, at(0));
    let b = aggregate(&reversed, &[], None, at(0));

    assert_eq!(a.actual_budget.to_bits(), b.actual_budget.to_bits());
}

#[test]
fn kickoff_milestone_anchors_span_and_week_numbers() {
    let tasks = vec![
        TaskBuilder::milestone(1, 0).build(),
        TaskBuilder::new(2, 7, 3).progress(100).build(),
        TaskBuilder::new(3, 14, 2).progress(100).build(),
        TaskBuilder::milestone(4, 20).progress(100).build(),
    ];

    let report = aggregate(&tasks, &[], None, at(0));

    assert_eq!(report.project_start, Some(day(0)));
    assert_eq!(report.project_end, Some(day(20)));
    assert_eq!(
        report.weekly_completion_histogram,
        BTreeMap::from([(2, 1), (3, 1)])
    );
}
