// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aggregate::AggregateReport;
use crate::errors::{PlanError, Result};
use crate::model::ProjectId;

use super::core::{ProjectCore, ProjectSnapshot};
use super::{Command, CoreStep, DomainEvent, RuntimeOptions};

/// Requests accepted by a project runtime. Each carries its own reply
/// channel.
enum Request {
    Apply {
        command: Command,
        reply: oneshot::Sender<Result<CoreStep>>,
    },
    RecomputeCriticalPath {
        reply: oneshot::Sender<Result<Option<DomainEvent>>>,
    },
    RefreshRollups {
        now: NaiveDateTime,
        reply: oneshot::Sender<AggregateReport>,
    },
    Shutdown,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Apply { command, .. } => f.debug_tuple("Apply").field(command).finish(),
            Request::RecomputeCriticalPath { .. } => f.write_str("RecomputeCriticalPath"),
            Request::RefreshRollups { now, .. } => {
                f.debug_tuple("RefreshRollups").field(now).finish()
            }
            Request::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Single writer for one project.
///
/// Owns a [`ProjectCore`] and handles requests one at a time, so two
/// structural edits on the same project can never interleave. After every
/// request that changed state it publishes a fresh snapshot; readers clone
/// the `Arc` and never see a half-applied command.
pub struct ProjectRuntime {
    core: ProjectCore,
    request_rx: mpsc::Receiver<Request>,
    snapshot_tx: watch::Sender<Arc<ProjectSnapshot>>,
    options: RuntimeOptions,
}

impl fmt::Debug for ProjectRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectRuntime")
            .field("project", &self.core.project_id())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ProjectRuntime {
    /// Spawn the runtime on the current Tokio runtime.
    pub fn spawn(core: ProjectCore, options: RuntimeOptions) -> (ProjectHandle, JoinHandle<()>) {
        let project_id: ProjectId = core.project_id().to_string();
        let (request_tx, request_rx) = mpsc::channel(options.command_buffer.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(core.snapshot().clone()));

        let runtime = Self {
            core,
            request_rx,
            snapshot_tx,
            options,
        };
        let join = tokio::spawn(runtime.run());

        let handle = ProjectHandle {
            project_id: Arc::from(project_id),
            request_tx,
            snapshot_rx,
        };
        (handle, join)
    }

    /// Main request loop. Ends on `Shutdown` or when every handle is gone.
    async fn run(mut self) {
        info!(project = %self.core.project_id(), "project runtime started");

        while let Some(request) = self.request_rx.recv().await {
            debug!(?request, "project runtime received request");

            match request {
                Request::Apply { command, reply } => {
                    let result = self.apply(command);
                    if result.is_ok() {
                        self.publish();
                    }
                    let _ = reply.send(result);
                }
                Request::RecomputeCriticalPath { reply } => {
                    let result = self.core.recompute_critical_path();
                    if result.is_ok() {
                        self.publish();
                    }
                    let _ = reply.send(result);
                }
                Request::RefreshRollups { now, reply } => {
                    let report = self.core.refresh_rollups(now);
                    self.publish();
                    let _ = reply.send(report);
                }
                Request::Shutdown => {
                    info!(project = %self.core.project_id(), "shutdown requested");
                    break;
                }
            }
        }

        info!(project = %self.core.project_id(), "project runtime exiting");
    }

    fn apply(&mut self, command: Command) -> Result<CoreStep> {
        let mut step = self.core.apply(command)?;

        if self.options.recompute_critical_path && self.core.snapshot().stale.critical_path {
            match self.core.recompute_critical_path() {
                Ok(Some(event)) => step.events.push(event),
                Ok(None) => {}
                Err(err) => warn!(
                    project = %self.core.project_id(),
                    error = %err,
                    "critical path left stale"
                ),
            }
        }

        Ok(step)
    }

    fn publish(&self) {
        self.snapshot_tx
            .send_replace(Arc::new(self.core.snapshot().clone()));
    }
}

/// Cloneable client for one project runtime.
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    project_id: Arc<str>,
    request_tx: mpsc::Sender<Request>,
    snapshot_rx: watch::Receiver<Arc<ProjectSnapshot>>,
}

impl ProjectHandle {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn closed(&self) -> PlanError {
        PlanError::RuntimeClosed(self.project_id.to_string())
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| self.closed())?;
        reply_rx.await.map_err(|_| self.closed())
    }

    /// Apply a command; waits until the runtime has committed or rejected it.
    pub async fn apply(&self, command: Command) -> Result<CoreStep> {
        self.request(|reply| Request::Apply { command, reply })
            .await?
    }

    pub async fn recompute_critical_path(&self) -> Result<Option<DomainEvent>> {
        self.request(|reply| Request::RecomputeCriticalPath { reply })
            .await?
    }

    pub async fn refresh_rollups(&self, now: NaiveDateTime) -> Result<AggregateReport> {
        self.request(|reply| Request::RefreshRollups { now, reply })
            .await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<ProjectSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait for the next published snapshot.
    pub async fn changed(&mut self) -> Result<Arc<ProjectSnapshot>> {
        if self.snapshot_rx.changed().await.is_err() {
            return Err(self.closed());
        }
        Ok(self.snapshot_rx.borrow_and_update().clone())
    }

    /// Ask the runtime to stop. Commands already queued are handled first.
    pub async fn shutdown(&self) -> Result<()> {
        self.request_tx
            .send(Request::Shutdown)
            .await
            .map_err(|_| self.closed())
    }
}
