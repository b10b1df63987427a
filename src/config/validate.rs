// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::{PlanError, Result};
use crate::model::MAX_DURATION_DAYS;

impl TryFrom<RawProjectFile> for ProjectFile {
    type Error = crate::errors::PlanError;

    fn try_from(raw: RawProjectFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_project(&raw)?;
        Ok(ProjectFile::new_unchecked(
            raw.project,
            raw.policy,
            raw.task,
            raw.resource,
        ))
    }
}

fn validate_raw_project(file: &RawProjectFile) -> Result<()> {
    validate_project_section(file)?;
    validate_task_values(file)?;
    validate_task_references(file)?;
    validate_resources(file)?;
    Ok(())
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn validate_project_section(file: &RawProjectFile) -> Result<()> {
    let project = &file.project;

    if project.id.trim().is_empty() {
        return Err(PlanError::ConfigError(
            "[project].id must not be empty".to_string(),
        ));
    }
    if let Some(budget) = project.budget {
        if !non_negative(budget) {
            return Err(PlanError::ConfigError(format!(
                "[project].budget must be a non-negative amount (got {budget})"
            )));
        }
    }

    Ok(())
}

fn validate_task_values(file: &RawProjectFile) -> Result<()> {
    let mut seen = HashSet::new();

    for task in &file.task {
        if !seen.insert(task.id) {
            return Err(PlanError::ConfigError(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        if i64::from(task.duration) > MAX_DURATION_DAYS {
            return Err(PlanError::ConfigError(format!(
                "task {} duration {} exceeds {MAX_DURATION_DAYS} days",
                task.id, task.duration
            )));
        }
        if task.progress > 100 {
            return Err(PlanError::ConfigError(format!(
                "task {} progress must be within 0..=100 (got {})",
                task.id, task.progress
            )));
        }
        if !non_negative(task.total_cost) {
            return Err(PlanError::ConfigError(format!(
                "task {} total_cost must be a non-negative amount (got {})",
                task.id, task.total_cost
            )));
        }
        for r in &task.assigned_resource {
            if r.unit > 100 {
                return Err(PlanError::ConfigError(format!(
                    "task {} resource '{}' unit must be within 0..=100 (got {})",
                    task.id, r.id, r.unit
                )));
            }
        }
    }

    Ok(())
}

fn validate_task_references(file: &RawProjectFile) -> Result<()> {
    let ids: HashSet<_> = file.task.iter().map(|t| t.id).collect();

    for task in &file.task {
        if let Some(parent) = task.parent_id {
            if parent == task.id {
                return Err(PlanError::ConfigError(format!(
                    "task {} cannot be its own parent",
                    task.id
                )));
            }
            if !ids.contains(&parent) {
                return Err(PlanError::ConfigError(format!(
                    "task {} has unknown parent {}",
                    task.id, parent
                )));
            }
        }

        for dep in &task.dependency {
            if dep.predecessor == task.id {
                return Err(PlanError::ConfigError(format!(
                    "task {} cannot depend on itself",
                    task.id
                )));
            }
            if !ids.contains(&dep.predecessor) {
                return Err(PlanError::ConfigError(format!(
                    "task {} has unknown predecessor {}",
                    task.id, dep.predecessor
                )));
            }
        }
    }

    Ok(())
}

fn validate_resources(file: &RawProjectFile) -> Result<()> {
    let mut seen = HashSet::new();

    for r in &file.resource {
        if !seen.insert(r.id.as_str()) {
            return Err(PlanError::ConfigError(format!(
                "duplicate resource id '{}'",
                r.id
            )));
        }
        if !non_negative(r.quantity) || !non_negative(r.price_per_quantity) {
            return Err(PlanError::ConfigError(format!(
                "resource '{}' quantity and price_per_quantity must be non-negative",
                r.id
            )));
        }
    }

    Ok(())
}
