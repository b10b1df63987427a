// src/errors.rs

//! Crate-wide error type, its stable kinds, and the `Result` alias.

use thiserror::Error;

use crate::model::TaskId;

#[derive(Error, Debug)]
pub enum PlanError {
    /// Malformed structural request: self-parent, parent cycle, out-of-range
    /// field values.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Cyclic dependency involving task {task}")]
    CyclicDependency { task: TaskId },

    #[error("Invalid transition for task {task}: {reason}")]
    InvalidTransition { task: TaskId, reason: String },

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Project not open: {0}")]
    ProjectNotFound(String),

    #[error("Project already open: {0}")]
    ProjectAlreadyOpen(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The per-project runtime is gone (its task ended or panicked).
    #[error("Project runtime closed: {0}")]
    RuntimeClosed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Stable classification of [`PlanError`], for callers that branch on the
/// kind of failure instead of matching message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidGraph,
    CyclicDependency,
    InvalidTransition,
    NotFound,
    /// The target already exists, e.g. opening an open project.
    Conflict,
    Config,
    Io,
    Other,
}

impl PlanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlanError::InvalidGraph(_) => ErrorKind::InvalidGraph,
            PlanError::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            PlanError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            PlanError::TaskNotFound(_)
            | PlanError::ResourceNotFound(_)
            | PlanError::ProjectNotFound(_) => ErrorKind::NotFound,
            PlanError::ProjectAlreadyOpen(_) => ErrorKind::Conflict,
            PlanError::ConfigError(_) | PlanError::TomlError(_) | PlanError::JsonError(_) => {
                ErrorKind::Config
            }
            PlanError::IoError(_) => ErrorKind::Io,
            PlanError::RuntimeClosed(_) | PlanError::Other(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn invalid_transition(task: TaskId, reason: impl Into<String>) -> Self {
        PlanError::InvalidTransition {
            task,
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PlanError>;
