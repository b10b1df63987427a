use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[serde(alias = "Active")]
    Active,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "on_hold", alias = "OnHold")]
    OnHold,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Active
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "on-hold" | "on_hold" | "onhold" => Ok(ProjectStatus::OnHold),
            other => Err(format!(
                "invalid project status: {other} (expected \"active\", \"completed\" or \"on-hold\")"
            )),
        }
    }
}

/// Category of a non-labor resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceCategory {
    #[serde(alias = "tool")]
    Tool,
    #[serde(alias = "equipment")]
    Equipment,
    #[serde(alias = "Materials", alias = "material", alias = "materials")]
    Material,
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceCategory::Tool => "Tool",
            ResourceCategory::Equipment => "Equipment",
            ResourceCategory::Material => "Material",
        };
        f.write_str(s)
    }
}

/// Group of a resource assigned to a task. Manpower is the labor group;
/// the rest mirror [`ResourceCategory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceGroup {
    #[serde(alias = "manpower")]
    Manpower,
    #[serde(alias = "tool")]
    Tool,
    #[serde(alias = "equipment")]
    Equipment,
    #[serde(alias = "Material", alias = "materials")]
    Materials,
}

impl Default for ResourceGroup {
    fn default() -> Self {
        ResourceGroup::Manpower
    }
}

/// Relationship between a predecessor and its successor.
///
/// - `FinishToStart`: successor starts after the predecessor finishes.
/// - `StartToStart`: successor starts after the predecessor starts.
/// - `FinishToFinish`: successor finishes after the predecessor finishes.
/// - `StartToFinish`: successor finishes after the predecessor starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    FinishToStart,
    StartToStart,
    FinishToFinish,
    StartToFinish,
}

impl Default for DependencyKind {
    fn default() -> Self {
        DependencyKind::FinishToStart
    }
}

impl DependencyKind {
    pub fn code(self) -> &'static str {
        match self {
            DependencyKind::FinishToStart => "FS",
            DependencyKind::StartToStart => "SS",
            DependencyKind::FinishToFinish => "FF",
            DependencyKind::StartToFinish => "SF",
        }
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FS" => Ok(DependencyKind::FinishToStart),
            "SS" => Ok(DependencyKind::StartToStart),
            "FF" => Ok(DependencyKind::FinishToFinish),
            "SF" => Ok(DependencyKind::StartToFinish),
            other => Err(format!(
                "invalid dependency type: {other} (expected FS, SS, FF or SF)"
            )),
        }
    }
}

/// What happens to a task's progress once it has reached 100%.
///
/// - `OneWay` (default): completion locks the task; lowering progress is an
///   invalid transition.
/// - `Reversible`: lowering progress unlocks the task again.
///
/// Dependency, resource and schedule edits are blocked on a completed task
/// under either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionLock {
    OneWay,
    Reversible,
}

impl Default for CompletionLock {
    fn default() -> Self {
        CompletionLock::OneWay
    }
}

impl FromStr for CompletionLock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "one-way" | "one_way" | "oneway" => Ok(CompletionLock::OneWay),
            "reversible" => Ok(CompletionLock::Reversible),
            other => Err(format!(
                "invalid completion_lock: {other} (expected \"one-way\" or \"reversible\")"
            )),
        }
    }
}

/// Per-project behavior switches, read from the `[policy]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub completion_lock: CompletionLock,
    /// Recompute `total_cost` from assignee daily rates whenever a task's
    /// duration or assignments change.
    pub derive_task_cost: bool,
}
