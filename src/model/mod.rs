// src/model/mod.rs

//! Domain records: tasks, projects, resources, and typed field updates.

pub mod project;
pub mod task;
pub mod update;

pub use project::{OtherResource, Project, ProjectId, ProjectUpdate};
pub use task::{
    AssignedResource, Dependency, MAX_DURATION_DAYS, NewTask, Task, TaskId, parse_dependency_list,
};
pub use update::{FieldUpdate, diff_fields};
