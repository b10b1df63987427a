// src/engine/registry.rs

//! Open projects, one runtime each.
//!
//! Writes to different projects go to different runtimes and never wait on
//! each other. The registry lock only guards the map itself and is never
//! held across an `.await`.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::core::ProjectCore;
use crate::engine::runtime::{ProjectHandle, ProjectRuntime};
use crate::engine::RuntimeOptions;
use crate::errors::{PlanError, Result};
use crate::model::ProjectId;

#[derive(Debug)]
struct Entry {
    handle: ProjectHandle,
    join: JoinHandle<()>,
}

#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: RwLock<HashMap<ProjectId, Entry>>,
    options: RuntimeOptions,
}

impl ProjectRegistry {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            options,
        }
    }

    /// Start a runtime for `core`. Fails if the project is already open.
    pub fn open(&self, core: ProjectCore) -> Result<ProjectHandle> {
        let id = core.project_id().to_string();
        let mut projects = self.projects.write();

        if projects.contains_key(&id) {
            return Err(PlanError::ProjectAlreadyOpen(id));
        }

        let (handle, join) = ProjectRuntime::spawn(core, self.options);
        projects.insert(
            id.clone(),
            Entry {
                handle: handle.clone(),
                join,
            },
        );

        info!(project = %id, open = projects.len(), "project opened");
        Ok(handle)
    }

    pub fn get(&self, id: &str) -> Option<ProjectHandle> {
        self.projects.read().get(id).map(|e| e.handle.clone())
    }

    pub fn project_ids(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self.projects.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stop the project's runtime once its queued commands are done.
    pub async fn close(&self, id: &str) -> Result<()> {
        let entry = self
            .projects
            .write()
            .remove(id)
            .ok_or_else(|| PlanError::ProjectNotFound(id.to_string()))?;

        entry.handle.shutdown().await?;
        if let Err(err) = entry.join.await {
            warn!(project = %id, error = %err, "project runtime ended abnormally");
            return Err(PlanError::RuntimeClosed(id.to_string()));
        }

        info!(project = %id, "project closed");
        Ok(())
    }

    /// Close every open project.
    pub async fn close_all(&self) -> Result<()> {
        for id in self.project_ids() {
            self.close(&id).await?;
        }
        Ok(())
    }
}
