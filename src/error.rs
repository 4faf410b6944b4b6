// ABOUTME: Application-wide error types for banksmith.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::deployer::DeployerError;
use crate::lock::LockError;
use crate::pipeline::PipelineError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid gateway: {0}")]
    InvalidGateway(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("receipt store: {0}")]
    Store(#[from] StoreError),

    #[error("deployer: {0}")]
    Deployer(#[from] DeployerError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
