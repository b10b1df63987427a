// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ProjectFile, RawProjectFile};
use crate::errors::Result;

/// Load a project file and return the raw `RawProjectFile`.
///
/// Files ending in `.json` are read as JSON, everything else as TOML. This
/// only deserializes; use [`load_and_validate`] for the semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawProjectFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let raw: RawProjectFile = if is_json {
        serde_json::from_str(&contents)?
    } else {
        toml::from_str(&contents)?
    };

    debug!(
        path = %path.display(),
        tasks = raw.task.len(),
        resources = raw.resource.len(),
        "project file loaded"
    );

    Ok(raw)
}

/// Load a project file and validate it.
///
/// Checks for:
/// - duplicate task and resource ids,
/// - out-of-range task and resource values,
/// - unknown or self-referencing parents and predecessors.
///
/// Dependency cycles are left to the critical path analysis.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ProjectFile> {
    let raw = load_from_path(&path)?;
    let file = ProjectFile::try_from(raw)?;
    Ok(file)
}

/// `Project.toml` in the current working directory.
pub fn default_project_path() -> PathBuf {
    PathBuf::from("Project.toml")
}
