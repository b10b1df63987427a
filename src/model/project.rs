// src/model/project.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::TaskId;
use crate::types::{ProjectStatus, ResourceCategory};

pub type ProjectId = String;

/// Project-level record. `progress` and `critical_path_days` are derived
/// fields written back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default, alias = "expectedEndDate")]
    pub expected_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub progress: f64,
    /// Next unused task id. Only ever increases.
    #[serde(default, alias = "taskIndex")]
    pub task_index: TaskId,
    #[serde(default, alias = "critical")]
    pub critical_path_days: i64,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            budget: None,
            expected_end_date: None,
            status: ProjectStatus::Active,
            progress: 0.0,
            task_index: 0,
            critical_path_days: 0,
        }
    }

    /// Hand out the next task id and advance the index.
    pub fn allocate_task_id(&mut self) -> TaskId {
        let id = self.task_index;
        self.task_index += 1;
        id
    }
}

/// Project-level edits that do not touch the task graph.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectUpdate {
    Name(String),
    Budget(Option<f64>),
    Status(ProjectStatus),
    ExpectedEndDate(Option<NaiveDate>),
}

/// Non-labor resource (tool, equipment, material). Contributes to cost only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub details: String,
    pub category: ResourceCategory,
    pub quantity: f64,
    #[serde(alias = "pricePerQuantity")]
    pub price_per_quantity: f64,
    #[serde(default)]
    pub provider: String,
}

impl OtherResource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: ResourceCategory,
        quantity: f64,
        price_per_quantity: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            details: String::new(),
            category,
            quantity,
            price_per_quantity,
            provider: String::new(),
        }
    }

    pub fn cost(&self) -> f64 {
        self.quantity * self.price_per_quantity
    }
}
