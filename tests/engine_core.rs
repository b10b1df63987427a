// tests/engine_core.rs
mod common;
use crate::common::builders::{ProjectBuilder, TaskBuilder, at, day, member};
use crate::common::{TestResult, assert_kind, init_tracing};

use std::collections::BTreeSet;

use taskplan::engine::{Command, DomainEvent, ProjectCore, Staleness};
use taskplan::errors::ErrorKind;
use taskplan::model::{
    Dependency, FieldUpdate, NewTask, OtherResource, Project, ProjectUpdate, diff_fields,
};
use taskplan::types::{Policy, ResourceCategory};

fn two_task_chain() -> ProjectCore {
    ProjectBuilder::new("p")
        .with_task(TaskBuilder::new(1, 0, 3).build())
        .with_task(TaskBuilder::new(2, 0, 2).after(1).order(1).build())
        .build_core()
}

#[test]
fn add_task_allocates_ids_from_task_index() -> TestResult {
    init_tracing();
    let mut core = two_task_chain();
    assert_eq!(core.snapshot().project.task_index, 3);

    let step = core.apply(Command::AddTask {
        parent_id: Some(1),
        position: None,
        task: NewTask::new("Inspection", day(4), 1),
    })?;

    assert_eq!(step.created, vec![3]);
    assert_eq!(step.stale, Staleness::all());
    assert_eq!(core.snapshot().project.task_index, 4);

    let added = core.snapshot().tasks.require(3)?;
    assert_eq!(added.parent_id, Some(1));
    assert_eq!(added.order, 0);
    assert_eq!(added.progress, 0);
    assert_eq!(added.total_cost, 0.0);
    Ok(())
}

#[test]
fn ids_are_never_reused_after_delete() -> TestResult {
    let mut core = two_task_chain();

    core.apply(Command::DeleteTask { task_id: 2 })?;
    let step = core.apply(Command::AddTask {
        parent_id: None,
        position: None,
        task: NewTask::new("Again", day(0), 1),
    })?;

    assert_eq!(step.created, vec![3]);
    assert!(!core.snapshot().tasks.contains(2));
    Ok(())
}

#[test]
fn add_with_unknown_predecessor_keeps_index_unchanged() {
    let mut core = two_task_chain();

    assert_kind(
        core.apply(Command::AddTask {
            parent_id: None,
            position: None,
            task: NewTask::new("Orphan", day(0), 1).after(Dependency::finish_to_start(50)),
        }),
        ErrorKind::NotFound,
    );
    assert_eq!(core.snapshot().project.task_index, 3);
}

#[test]
fn delete_notifies_assignees_and_unlinks_dependents() -> TestResult {
    let mut core = ProjectBuilder::new("p")
        .with_task(
            TaskBuilder::new(1, 0, 3)
                .assign(member("u1", "b@site.test"))
                .assign(member("u2", "a@site.test"))
                .build(),
        )
        .with_task(
            TaskBuilder::new(2, 0, 1)
                .parent(1)
                .assign(member("u3", "c@site.test"))
                .build(),
        )
        .with_task(TaskBuilder::new(3, 0, 2).after(1).after(2).order(1).build())
        .build_core();
    assert_eq!(core.snapshot().tasks.dependents_of(2), vec![3]);

    let step = core.apply(Command::DeleteTask { task_id: 1 })?;

    assert_eq!(step.removed, BTreeSet::from([1, 2]));
    assert_eq!(step.touched, BTreeSet::from([3]));
    assert_eq!(
        step.events,
        vec![
            DomainEvent::TaskDeleted {
                task_id: 1,
                affected_resource_emails: vec!["a@site.test".into(), "b@site.test".into()],
            },
            DomainEvent::TaskDeleted {
                task_id: 2,
                affected_resource_emails: vec!["c@site.test".into()],
            },
        ]
    );

    let remaining = core.snapshot().tasks.require(3)?;
    assert!(remaining.dependency.is_empty());
    assert_eq!(remaining.order, 0);
    assert!(core.snapshot().tasks.dependents_of(1).is_empty());
    Ok(())
}

#[test]
fn progress_change_emits_event_and_marks_rollups_stale() -> TestResult {
    let mut core = two_task_chain();
    core.recompute_critical_path()?;
    core.refresh_rollups(at(0));

    let step = core.apply(Command::UpdateTask {
        task_id: 1,
        update: FieldUpdate::Progress(40),
    })?;

    assert_eq!(
        step.events,
        vec![DomainEvent::TaskProgressChanged {
            task_id: 1,
            new_progress: 40
        }]
    );
    assert!(step.stale.rollups);
    assert!(!step.stale.critical_path);
    assert!(!core.snapshot().stale.critical_path);
    assert!(core.snapshot().stale.rollups);
    Ok(())
}

#[test]
fn cyclic_dependency_update_is_rejected_atomically() -> TestResult {
    let mut core = two_task_chain();
    core.recompute_critical_path()?;
    let before = core.snapshot().clone();

    assert_kind(
        core.apply(Command::UpdateTask {
            task_id: 1,
            update: FieldUpdate::Dependency(vec![Dependency::finish_to_start(2)]),
        }),
        ErrorKind::CyclicDependency,
    );

    assert_eq!(core.snapshot(), &before);
    assert_eq!(core.snapshot().critical_path.as_ref().map(|c| c.length_days), Some(5));
    Ok(())
}

#[test]
fn multi_field_update_is_all_or_nothing() {
    let mut core = two_task_chain();

    assert_kind(
        core.apply(Command::UpdateTaskFields {
            task_id: 1,
            updates: vec![
                FieldUpdate::Name("Renamed".into()),
                FieldUpdate::Duration(-3),
            ],
        }),
        ErrorKind::InvalidGraph,
    );

    assert_eq!(core.snapshot().tasks.get(1).map(|t| t.name.as_str()), Some("task 1"));
}

#[test]
fn update_of_missing_task_is_not_found() {
    let mut core = two_task_chain();

    assert_kind(
        core.apply(Command::UpdateTask {
            task_id: 404,
            update: FieldUpdate::Name("x".into()),
        }),
        ErrorKind::NotFound,
    );
}

#[test]
fn critical_path_change_is_reported_once() -> TestResult {
    let mut core = two_task_chain();

    assert_eq!(
        core.recompute_critical_path()?,
        Some(DomainEvent::CriticalPathChanged { new_length_days: 5 })
    );
    assert_eq!(core.recompute_critical_path()?, None);
    assert_eq!(core.snapshot().project.critical_path_days, 5);

    core.apply(Command::UpdateTask {
        task_id: 2,
        update: FieldUpdate::Duration(6),
    })?;
    assert!(core.snapshot().stale.critical_path);
    assert_eq!(
        core.recompute_critical_path()?,
        Some(DomainEvent::CriticalPathChanged { new_length_days: 9 })
    );
    Ok(())
}

#[test]
fn refresh_rollups_writes_project_progress() {
    let mut core = ProjectBuilder::new("p")
        .with_task(TaskBuilder::new(1, 0, 3).progress(100).build())
        .with_task(TaskBuilder::new(2, 0, 3).progress(20).order(1).build())
        .build_core();

    let report = core.refresh_rollups(at(1));

    assert_eq!(report.overall_progress, Some(60.0));
    assert_eq!(core.snapshot().project.progress, 60.0);
    assert!(!core.snapshot().stale.rollups);
}

#[test]
fn import_appends_tasks_in_order() -> TestResult {
    let mut core = two_task_chain();

    let step = core.apply(Command::ImportTasks {
        parent_id: None,
        tasks: vec![
            NewTask::new("C", day(5), 1),
            NewTask::new("D", day(6), 1).after(Dependency::finish_to_start(1)),
        ],
    })?;

    assert_eq!(step.created, vec![3, 4]);
    let tasks = &core.snapshot().tasks;
    assert_eq!(tasks.require(3)?.order, 2);
    assert_eq!(tasks.require(4)?.order, 3);
    assert!(tasks.orders_are_contiguous());
    Ok(())
}

#[test]
fn resources_can_be_upserted_and_removed() -> TestResult {
    let mut core = two_task_chain();
    let cement = OtherResource::new("cement", "Cement", ResourceCategory::Material, 2.0, 500.0);

    core.apply(Command::UpsertResource(cement.clone()))?;
    core.apply(Command::UpsertResource(OtherResource {
        quantity: 3.0,
        ..cement
    }))?;
    assert_eq!(core.snapshot().resources.len(), 1);
    assert_eq!(core.snapshot().report(at(0)).resource_cost, 1500.0);

    let step = core.apply(Command::RemoveResource {
        resource_id: "cement".into(),
    })?;
    assert!(step.stale.rollups);
    assert!(core.snapshot().resources.is_empty());

    assert_kind(
        core.apply(Command::RemoveResource {
            resource_id: "cement".into(),
        }),
        ErrorKind::NotFound,
    );
    Ok(())
}

#[test]
fn project_budget_update_is_validated() -> TestResult {
    let mut core = two_task_chain();

    let step = core.apply(Command::UpdateProject(ProjectUpdate::Budget(Some(900.0))))?;
    assert!(step.stale.rollups);
    assert_eq!(core.snapshot().project.budget, Some(900.0));

    assert_kind(
        core.apply(Command::UpdateProject(ProjectUpdate::Budget(Some(-1.0)))),
        ErrorKind::InvalidGraph,
    );
    Ok(())
}

#[test]
fn template_creates_sequential_top_level_tasks() -> TestResult {
    let drafts = vec![
        NewTask::new("Survey", day(0), 2),
        NewTask::new("Dig", day(0), 3).after(Dependency::finish_to_start(0)),
        NewTask::new("Pour", day(0), 4).after(Dependency::finish_to_start(1)),
    ];
    let mut project = Project::new("tpl", "From template");
    project.task_index = 10;

    let mut core = ProjectCore::from_template(project, drafts, day(100), Policy::default())?;
    let snapshot = core.snapshot();

    assert_eq!(snapshot.project.expected_end_date, Some(day(109)));
    assert_eq!(snapshot.project.task_index, 13);
    assert_eq!(snapshot.tasks.require(11)?.order, 1);
    assert!(snapshot.tasks.require(11)?.depends_on(10));
    assert!(snapshot.tasks.require(12)?.depends_on(11));

    core.recompute_critical_path()?;
    assert_eq!(core.snapshot().project.critical_path_days, 9);
    Ok(())
}

#[test]
fn template_with_unknown_draft_reference_fails() {
    let drafts = vec![NewTask::new("Only", day(0), 1).after(Dependency::finish_to_start(3))];

    assert_kind(
        ProjectCore::from_template(Project::new("t", "T"), drafts, day(0), Policy::default()),
        ErrorKind::NotFound,
    );
}

#[test]
fn member_and_team_filters() {
    let mut crew = member("u1", "u1@site.test");
    crew.team_name = Some("crew".into());

    let core = ProjectBuilder::new("p")
        .with_task(TaskBuilder::new(1, 0, 1).assign(crew).build())
        .with_task(TaskBuilder::new(2, 0, 1).assign(member("u2", "u2@site.test")).order(1).build())
        .build_core();
    let snapshot = core.snapshot();

    let ids = |tasks: Vec<&taskplan::model::Task>| tasks.iter().map(|t| t.id).collect::<Vec<_>>();
    assert_eq!(ids(snapshot.tasks_for_member("u2")), vec![2]);
    assert_eq!(ids(snapshot.tasks_for_team("crew")), vec![1]);
    assert!(snapshot.tasks_for_team("nobody").is_empty());
}

#[test]
fn diff_fields_feeds_back_into_update() -> TestResult {
    let mut core = two_task_chain();
    let before = core.snapshot().tasks.require(2)?.clone();
    let mut after = before.clone();
    after.name = "Walls".into();
    after.duration = 4;

    let updates = diff_fields(&before, &after);
    assert_eq!(
        updates,
        vec![FieldUpdate::Name("Walls".into()), FieldUpdate::Duration(4)]
    );

    core.apply(Command::UpdateTaskFields {
        task_id: 2,
        updates,
    })?;
    assert_eq!(core.snapshot().tasks.require(2)?, &after);
    Ok(())
}
