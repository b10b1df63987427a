// src/model/task.rs

//! Task records and predecessor links.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::PlanError;
use crate::types::{DependencyKind, ResourceGroup};

/// Task identifier, allocated from the owning project's task index.
pub type TaskId = u64;

/// Upper bound accepted for a task duration, in days.
pub const MAX_DURATION_DAYS: i64 = 36_500;

/// A unit of scheduled work. `duration == 0` marks a milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    /// Length in whole days.
    #[serde(default)]
    pub duration: u32,
    /// Percent complete, 0..=100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<TaskId>,
    /// Predecessors, in the order they were entered.
    #[serde(default, with = "dependency_list")]
    pub dependency: Vec<Dependency>,
    /// Position among tasks sharing the same `parent_id`.
    #[serde(default)]
    pub order: u32,
    #[serde(default, alias = "assignedResource")]
    pub assigned_resource: Vec<AssignedResource>,
    #[serde(default, alias = "totalCost")]
    pub total_cost: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Task {
    pub fn is_milestone(&self) -> bool {
        self.duration == 0
    }

    /// A task at 100% is locked for dependency, resource and schedule edits.
    pub fn is_locked(&self) -> bool {
        self.progress >= 100
    }

    pub fn depends_on(&self, other: TaskId) -> bool {
        self.dependency.iter().any(|d| d.predecessor == other)
    }
}

/// Fields supplied when creating a task. Everything else starts at its
/// lifecycle default (progress 0, cost 0, no resources).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "dependency_list")]
    pub dependency: Vec<Dependency>,
}

impl NewTask {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, duration: u32) -> Self {
        Self {
            name: name.into(),
            start_date,
            duration,
            notes: None,
            dependency: Vec::new(),
        }
    }

    pub fn after(mut self, dep: Dependency) -> Self {
        self.dependency.push(dep);
        self
    }

    pub fn into_task(self, id: TaskId, parent_id: Option<TaskId>, order: u32) -> Task {
        Task {
            id,
            name: self.name,
            start_date: self.start_date,
            duration: self.duration,
            progress: 0,
            parent_id,
            dependency: self.dependency,
            order,
            assigned_resource: Vec::new(),
            total_cost: 0.0,
            notes: self.notes,
        }
    }
}

/// A resource (person, tool, material) allocated to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: ResourceGroup,
    /// Allocation percentage, 0..=100.
    #[serde(default = "full_allocation")]
    pub unit: u8,
    /// Contact used for task notifications.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, alias = "teamName")]
    pub team_name: Option<String>,
    /// Cost per fully-allocated day, used when task cost is derived.
    #[serde(default, alias = "dailyRate")]
    pub daily_rate: Option<f64>,
}

fn full_allocation() -> u8 {
    100
}

impl AssignedResource {
    pub fn new(id: impl Into<String>, unit: u8) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            group: ResourceGroup::default(),
            unit,
            email: None,
            roles: Vec::new(),
            team_name: None,
            daily_rate: None,
        }
    }
}

/// One predecessor link, written by the Gantt widget as e.g. `"3FS+2d"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub predecessor: TaskId,
    pub kind: DependencyKind,
    /// Signed offset in days applied to the constraint.
    pub lag: i32,
}

impl Dependency {
    pub fn finish_to_start(predecessor: TaskId) -> Self {
        Self {
            predecessor,
            kind: DependencyKind::FinishToStart,
            lag: 0,
        }
    }

    pub fn with_kind(mut self, kind: DependencyKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_lag(mut self, lag: i32) -> Self {
        self.lag = lag;
        self
    }
}

static DEPENDENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(FS|SS|FF|SF)?\s*(?:([+-])\s*(\d+)\s*(?:d|days?)?)?\s*$")
        .expect("dependency pattern is valid")
});

impl FromStr for Dependency {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DEPENDENCY_RE
            .captures(s)
            .ok_or_else(|| PlanError::InvalidGraph(format!("invalid dependency '{s}'")))?;

        let predecessor = caps[1]
            .parse::<TaskId>()
            .map_err(|e| PlanError::InvalidGraph(format!("invalid dependency '{s}': {e}")))?;

        let kind = match caps.get(2) {
            Some(m) => m.as_str().parse().map_err(PlanError::InvalidGraph)?,
            None => DependencyKind::FinishToStart,
        };

        let lag = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(amount)) => {
                let amount: i32 = amount.as_str().parse().map_err(|e| {
                    PlanError::InvalidGraph(format!("invalid lag in dependency '{s}': {e}"))
                })?;
                if sign.as_str() == "-" { -amount } else { amount }
            }
            _ => 0,
        };

        Ok(Self {
            predecessor,
            kind,
            lag,
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.predecessor, self.kind.code())?;
        if self.lag != 0 {
            write!(f, "{:+}d", self.lag)?;
        }
        Ok(())
    }
}

/// Parse a comma-separated predecessor string such as `"2FS,3SS+1d"`.
/// Empty segments are skipped, so `""` yields no dependencies.
pub fn parse_dependency_list(s: &str) -> Result<Vec<Dependency>, PlanError> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}

/// Serde adapter: accepts a joined string, a list of strings/ids, or null;
/// always writes a list of strings.
pub(crate) mod dependency_list {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Dependency, TaskId, parse_dependency_list};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawItem {
        Id(TaskId),
        Text(String),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawList {
        Joined(String),
        Items(Vec<RawItem>),
    }

    pub fn serialize<S: Serializer>(deps: &[Dependency], ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_seq(deps.iter().map(|d| d.to_string()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<Dependency>, D::Error> {
        let raw = Option::<RawList>::deserialize(de)?;
        match raw {
            None => Ok(Vec::new()),
            Some(RawList::Joined(s)) => parse_dependency_list(&s).map_err(D::Error::custom),
            Some(RawList::Items(items)) => items
                .into_iter()
                .map(|item| match item {
                    RawItem::Id(id) => Ok(Dependency::finish_to_start(id)),
                    RawItem::Text(s) => s.parse::<Dependency>().map_err(D::Error::custom),
                })
                .collect(),
        }
    }
}
