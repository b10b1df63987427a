// src/config/model.rs

use serde::{Deserialize, Serialize};

use crate::model::{OtherResource, Project, Task};
use crate::types::Policy;

/// Project file as read from disk, before validation.
///
/// ```toml
/// [project]
/// id = "house-42"
/// name = "Two-storey house"
/// budget = 250000.0
///
/// [policy]
/// completion_lock = "one-way"
///
/// [[task]]
/// id = 1
/// name = "Foundation"
/// start_date = "2024-03-04"
/// duration = 5
///
/// [[task]]
/// id = 2
/// name = "Walls"
/// start_date = "2024-03-11"
/// duration = 10
/// dependency = "1FS+2d"
///
/// [[resource]]
/// id = "cement"
/// name = "Cement"
/// category = "Material"
/// quantity = 2
/// price_per_quantity = 500.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawProjectFile {
    pub project: Project,

    #[serde(default)]
    pub policy: Policy,

    /// `[[task]]` entries.
    #[serde(default, alias = "tasks")]
    pub task: Vec<Task>,

    /// `[[resource]]` entries (non-labor resources).
    #[serde(default, alias = "resources")]
    pub resource: Vec<OtherResource>,
}

/// Validated project file. Only built through `TryFrom<RawProjectFile>`
/// or [`ProjectFile::new_unchecked`].
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub project: Project,
    pub policy: Policy,
    pub tasks: Vec<Task>,
    pub resources: Vec<OtherResource>,
}

impl ProjectFile {
    /// Assemble a file without running validation. The core still checks
    /// the task tree when it is built.
    pub fn new_unchecked(
        project: Project,
        policy: Policy,
        tasks: Vec<Task>,
        resources: Vec<OtherResource>,
    ) -> Self {
        Self {
            project,
            policy,
            tasks,
            resources,
        }
    }
}
