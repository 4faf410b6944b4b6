// ABOUTME: Error types for stage execution and pipeline orchestration.
// ABOUTME: StageError covers one stage; PipelineError adds the failing stage as context.

use snafu::Snafu;

use super::StageKind;
use crate::deployer::DeployerError;
use crate::store::StoreError;
use crate::types::{Address, EntityKey};

/// Errors that stop a stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// The ledger refused to create the entity. No receipt was written.
    #[error("failed to deploy {key}: {source}")]
    DeploymentFailed {
        key: EntityKey,
        source: DeployerError,
    },

    /// A registration call was rejected.
    #[error("{method} for {key} failed: {source}")]
    TransactionFailed {
        key: EntityKey,
        method: &'static str,
        source: DeployerError,
    },

    /// A read-only registration check failed.
    #[error("{method} check for {key} failed: {source}")]
    QueryFailed {
        key: EntityKey,
        method: &'static str,
        source: DeployerError,
    },

    /// A prerequisite receipt is absent: a prior stage was skipped or failed.
    #[error("{needed_by} requires {dependency}, which has not been deployed")]
    MissingDependency {
        needed_by: String,
        dependency: EntityKey,
    },

    /// The entity exists on the ledger but its receipt could not be persisted.
    /// A re-run will not know about it.
    #[error("{key} was deployed at {address} but its receipt could not be recorded: {source}")]
    Unrecorded {
        key: EntityKey,
        address: Address,
        source: StoreError,
    },

    #[error("unexpected answer to {method} for {key}: {detail}")]
    UnexpectedResponse {
        key: String,
        method: &'static str,
        detail: String,
    },

    #[error("failed to encode configuration for {key}: {source}")]
    Encode {
        key: EntityKey,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    DeploymentFailed,
    TransactionFailed,
    QueryFailed,
    /// Any deployer call that ran out of time.
    Timeout,
    MissingDependency,
    Unrecorded,
    UnexpectedResponse,
    Encode,
    Store,
}

impl StageError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> StageErrorKind {
        match self {
            StageError::DeploymentFailed { source, .. }
            | StageError::TransactionFailed { source, .. }
            | StageError::QueryFailed { source, .. }
                if source.is_timeout() =>
            {
                StageErrorKind::Timeout
            }
            StageError::DeploymentFailed { .. } => StageErrorKind::DeploymentFailed,
            StageError::TransactionFailed { .. } => StageErrorKind::TransactionFailed,
            StageError::QueryFailed { .. } => StageErrorKind::QueryFailed,
            StageError::MissingDependency { .. } => StageErrorKind::MissingDependency,
            StageError::Unrecorded { .. } => StageErrorKind::Unrecorded,
            StageError::UnexpectedResponse { .. } => StageErrorKind::UnexpectedResponse,
            StageError::Encode { .. } => StageErrorKind::Encode,
            StageError::Store(_) => StageErrorKind::Store,
        }
    }
}

/// Pipeline failure with the stage that caused it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    #[snafu(display("stage {stage} failed: {source}"))]
    Stage { stage: StageKind, source: StageError },

    #[snafu(display("stage {stage} needs {dependency}, which no earlier stage produces"))]
    InvalidOrder {
        stage: StageKind,
        dependency: EntityKey,
    },
}

impl PipelineError {
    pub fn stage(&self) -> StageKind {
        match self {
            PipelineError::Stage { stage, .. } | PipelineError::InvalidOrder { stage, .. } => {
                *stage
            }
        }
    }

    /// The underlying stage error, if a stage ran and failed.
    pub fn stage_error(&self) -> Option<&StageError> {
        match self {
            PipelineError::Stage { source, .. } => Some(source),
            PipelineError::InvalidOrder { .. } => None,
        }
    }
}
