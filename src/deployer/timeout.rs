// ABOUTME: Deadline enforcement for any deployer.
// ABOUTME: A call that outlives its timeout fails with DeployerError::Timeout.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use super::{Arg, Artifact, Deployed, Deployer, DeployerError, TxReceipt};
use crate::types::Address;

/// Wraps a deployer so every operation is bounded by `timeout`.
///
/// The inner future is dropped when the deadline passes. For `deploy` this
/// means the contract may still be created remotely without a receipt.
#[derive(Debug, Clone)]
pub struct TimeoutDeployer<D> {
    inner: D,
    timeout: Duration,
}

impl<D> TimeoutDeployer<D> {
    pub fn new(inner: D, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, DeployerError>
    where
        F: Future<Output = Result<T, DeployerError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(DeployerError::Timeout {
                operation,
                after: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl<D: Deployer> Deployer for TimeoutDeployer<D> {
    async fn deploy(&self, artifact: &Artifact) -> Result<Deployed, DeployerError> {
        self.bounded("deploy", self.inner.deploy(artifact)).await
    }

    async fn call(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<Arg, DeployerError> {
        self.bounded("call", self.inner.call(address, method, args))
            .await
    }

    async fn send(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<TxReceipt, DeployerError> {
        self.bounded("send", self.inner.send(address, method, args))
            .await
    }
}
