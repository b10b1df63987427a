// tests/config_loader.rs
mod common;
use crate::common::builders::{ProjectBuilder, TaskBuilder, day};
use crate::common::{TestResult, assert_kind, init_tracing};

use std::io::Write;

use tempfile::{Builder, NamedTempFile};
use taskplan::config::{default_project_path, load_and_validate, load_from_path};
use taskplan::engine::ProjectCore;
use taskplan::errors::{ErrorKind, PlanError};
use taskplan::types::{CompletionLock, DependencyKind, ProjectStatus, ResourceCategory};

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    write!(file, "{contents}").expect("write temp file");
    file
}

#[test]
fn loads_toml_project_with_dependency_strings() -> TestResult {
    init_tracing();
    let file = toml_file(
        r#"
[project]
id = "house"
name = "House"
budget = 5000.0
status = "on-hold"

[policy]
completion_lock = "reversible"

[[task]]
id = 1
name = "Foundation"
start_date = "2024-01-01"
duration = 5

[[task]]
id = 2
name = "Walls"
start_date = "2024-01-08"
duration = 10
order = 1
dependency = "1FS+2d"

[[task]]
id = 3
name = "Roof"
start_date = "2024-01-20"
duration = 4
order = 2
dependency = ["1", "2SS-1d"]

[[resource]]
id = "cement"
name = "Cement"
category = "Materials"
quantity = 2
price_per_quantity = 500.0
"#,
    );

    let project = load_and_validate(file.path())?;

    assert_eq!(project.project.id, "house");
    assert_eq!(project.project.status, ProjectStatus::OnHold);
    assert_eq!(project.policy.completion_lock, CompletionLock::Reversible);
    assert_eq!(project.tasks.len(), 3);
    assert_eq!(project.tasks[0].start_date, day(0));

    let walls = &project.tasks[1];
    assert_eq!(walls.dependency.len(), 1);
    assert_eq!(walls.dependency[0].predecessor, 1);
    assert_eq!(walls.dependency[0].lag, 2);

    let roof = &project.tasks[2];
    assert_eq!(roof.dependency[1].kind, DependencyKind::StartToStart);
    assert_eq!(roof.dependency[1].lag, -1);

    assert_eq!(project.resources[0].category, ResourceCategory::Material);
    assert!((project.resources[0].cost() - 1000.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn loads_json_project_with_camel_case_fields() -> TestResult {
    let mut file = Builder::new().suffix(".json").tempfile()?;
    write!(
        file,
        r#"{{
  "project": {{ "id": "p1", "name": "P", "taskIndex": 7, "expectedEndDate": "2024-02-01" }},
  "tasks": [
    {{ "id": 1, "name": "A", "startDate": "2024-01-01", "duration": 2, "totalCost": 10.5 }},
    {{ "id": 2, "name": "B", "startDate": "2024-01-03", "duration": 1, "parentId": 1,
       "dependency": "1", "assignedResource": [{{ "id": "u1", "unit": 50, "teamName": "crew" }}] }}
  ]
}}"#
    )?;

    let project = load_and_validate(file.path())?;

    assert_eq!(project.project.task_index, 7);
    assert_eq!(project.project.expected_end_date, Some(day(31)));
    assert_eq!(project.tasks[0].total_cost, 10.5);
    assert_eq!(project.tasks[1].parent_id, Some(1));
    assert_eq!(project.tasks[1].assigned_resource[0].unit, 50);
    assert_eq!(
        project.tasks[1].assigned_resource[0].team_name.as_deref(),
        Some("crew")
    );
    Ok(())
}

#[test]
fn unknown_predecessor_is_a_config_error() {
    let file = toml_file(
        r#"
[project]
id = "p"
name = "P"

[[task]]
id = 1
name = "A"
start_date = "2024-01-01"
dependency = "42"
"#,
    );

    match load_and_validate(file.path()) {
        Err(PlanError::ConfigError(msg)) => {
            assert!(msg.contains("unknown predecessor"));
            assert!(msg.contains("42"));
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn duplicate_ids_and_bad_values_are_rejected() {
    let dup = ProjectBuilder::new("p")
        .with_task(TaskBuilder::new(1, 0, 1).build())
        .with_task(TaskBuilder::new(1, 0, 1).build())
        .raw();
    assert_kind(taskplan::config::ProjectFile::try_from(dup), ErrorKind::Config);

    let progress = ProjectBuilder::new("p")
        .with_task(TaskBuilder::new(1, 0, 1).progress(150).build())
        .raw();
    assert_kind(
        taskplan::config::ProjectFile::try_from(progress),
        ErrorKind::Config,
    );

    let orphan = ProjectBuilder::new("p")
        .with_task(TaskBuilder::new(1, 0, 1).parent(9).build())
        .raw();
    assert_kind(
        taskplan::config::ProjectFile::try_from(orphan),
        ErrorKind::Config,
    );
}

#[test]
fn malformed_dependency_string_fails_to_parse() {
    let file = toml_file(
        r#"
[project]
id = "p"
name = "P"

[[task]]
id = 1
name = "A"
start_date = "2024-01-01"
dependency = "soon"
"#,
    );

    assert_kind(load_from_path(file.path()), ErrorKind::Config);
}

#[test]
fn missing_file_is_an_io_error() {
    assert_kind(
        load_and_validate("/definitely/not/here/Project.toml"),
        ErrorKind::Io,
    );
}

#[test]
fn default_path_is_project_toml_in_cwd() {
    assert_eq!(default_project_path(), std::path::PathBuf::from("Project.toml"));
}

#[test]
fn loaded_cycle_keeps_critical_path_unset() -> TestResult {
    let file = toml_file(
        r#"
[project]
id = "p"
name = "P"
critical = 12

[[task]]
id = 1
name = "A"
start_date = "2024-01-01"
duration = 1
dependency = "2"

[[task]]
id = 2
name = "B"
start_date = "2024-01-01"
duration = 1
order = 1
dependency = "1"
"#,
    );

    let mut core = ProjectCore::from_file(load_and_validate(file.path())?)?;

    assert_kind(core.recompute_critical_path(), ErrorKind::CyclicDependency);
    assert!(core.snapshot().critical_path.is_none());
    assert_eq!(core.snapshot().project.critical_path_days, 12);
    Ok(())
}

#[test]
fn loading_repairs_orders_and_task_index() -> TestResult {
    let file = ProjectBuilder::new("p")
        .with_task_index(2)
        .with_task(TaskBuilder::new(4, 0, 1).order(3).build())
        .with_task(TaskBuilder::new(9, 0, 1).order(3).build())
        .build_file();

    let core = ProjectCore::from_file(file)?;
    let snapshot = core.snapshot();

    assert_eq!(snapshot.project.task_index, 10);
    assert_eq!(snapshot.tasks.require(4)?.order, 0);
    assert_eq!(snapshot.tasks.require(9)?.order, 1);
    Ok(())
}
