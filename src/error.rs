use thiserror::Error;

use crate::store::{JOB_STORE, Missing};
use crate::workflow::{JobStatus, WorkflowStep};

/// Failures returned by workflow and notification operations.
///
/// Every variant carries enough context (job id, current step) for a caller
/// to render a meaningful message without re-reading the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{operation} rejected for job {job_id}: step is {current}, expected {required}")]
    InvalidTransition {
        operation: &'static str,
        job_id: String,
        current: WorkflowStep,
        required: String,
    },

    #[error("{operation} rejected for job {job_id} ({status} at {current}): {reason}")]
    PreconditionFailed {
        operation: &'static str,
        job_id: String,
        status: JobStatus,
        current: WorkflowStep,
        reason: String,
    },

    #[error("{operation} for job {job_id} at {current} has no defined transition")]
    UnresolvedTransition {
        operation: &'static str,
        job_id: String,
        current: WorkflowStep,
    },
}

/// Tag for branching on an [`EngineError`] without matching its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidTransition,
    PreconditionFailed,
    UnresolvedTransition,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound { .. } => ErrorKind::NotFound,
            EngineError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            EngineError::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            EngineError::UnresolvedTransition { .. } => ErrorKind::UnresolvedTransition,
        }
    }

    /// The job the failure refers to, if any.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            EngineError::NotFound { entity, id } if *entity == JOB_STORE => Some(id.as_str()),
            EngineError::NotFound { .. } => None,
            EngineError::InvalidTransition { job_id, .. }
            | EngineError::PreconditionFailed { job_id, .. }
            | EngineError::UnresolvedTransition { job_id, .. } => Some(job_id.as_str()),
        }
    }

    /// The step the job was at when the operation was rejected.
    pub fn current_step(&self) -> Option<WorkflowStep> {
        match self {
            EngineError::NotFound { .. } => None,
            EngineError::InvalidTransition { current, .. }
            | EngineError::PreconditionFailed { current, .. }
            | EngineError::UnresolvedTransition { current, .. } => Some(*current),
        }
    }
}

impl From<Missing> for EngineError {
    fn from(missing: Missing) -> Self {
        EngineError::NotFound {
            entity: missing.store,
            id: missing.id,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors from the binary layer: configuration and data files.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Unsupported data file: {0} (expected .json or .toml)")]
    UnsupportedFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
