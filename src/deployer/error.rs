// ABOUTME: Error types for deployer operations.
// ABOUTME: Keeps remote rejections, transport failures, and timeouts distinct.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DeployerError {
    /// The ledger refused to create the contract.
    #[error("deployment rejected: {0}")]
    DeploymentFailed(String),

    /// A state-mutating call was rejected or reverted.
    #[error("transaction failed: {0}")]
    TransactionFailed(String),

    /// A read-only query failed.
    #[error("query failed: {0}")]
    CallFailed(String),

    /// The caller-supplied deadline passed before the ledger answered.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The gateway could not be reached or the connection broke.
    #[error("gateway unreachable: {0}")]
    Transport(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl DeployerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeployerError::Timeout { .. })
    }
}
