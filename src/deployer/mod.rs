// ABOUTME: The deployer capability: create contracts, query and mutate deployed ones.
// ABOUTME: Exposes the trait plus the gateway, timeout, and simulated implementations.

mod artifact;
mod error;
mod http;
mod simulated;
mod timeout;

pub use artifact::{Arg, Artifact, ArtifactKind, ServiceKind, methods};
pub use error::DeployerError;
pub use http::HttpDeployer;
pub use simulated::{LedgerCall, SimulatedLedger};
pub use timeout::TimeoutDeployer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::ResourceCost;
use crate::types::{Address, TxHash};

/// Outcome of a successful contract creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployed {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub gas_used: ResourceCost,
}

/// Outcome of a successful state-mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub gas_used: ResourceCost,
}

/// Access to the ledger the pipeline deploys onto.
///
/// Every operation is awaited to completion; implementations must not return
/// before the ledger has accepted or rejected the request.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Create a contract from its code and constructor arguments.
    async fn deploy(&self, artifact: &Artifact) -> Result<Deployed, DeployerError>;

    /// Read-only query against a deployed contract.
    async fn call(&self, address: &Address, method: &str, args: &[Arg])
    -> Result<Arg, DeployerError>;

    /// State-mutating call against a deployed contract.
    async fn send(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<TxReceipt, DeployerError>;
}

#[async_trait]
impl<D: Deployer + ?Sized> Deployer for &D {
    async fn deploy(&self, artifact: &Artifact) -> Result<Deployed, DeployerError> {
        (**self).deploy(artifact).await
    }

    async fn call(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<Arg, DeployerError> {
        (**self).call(address, method, args).await
    }

    async fn send(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<TxReceipt, DeployerError> {
        (**self).send(address, method, args).await
    }
}

#[async_trait]
impl<D: Deployer + ?Sized> Deployer for Arc<D> {
    async fn deploy(&self, artifact: &Artifact) -> Result<Deployed, DeployerError> {
        (**self).deploy(artifact).await
    }

    async fn call(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<Arg, DeployerError> {
        (**self).call(address, method, args).await
    }

    async fn send(
        &self,
        address: &Address,
        method: &str,
        args: &[Arg],
    ) -> Result<TxReceipt, DeployerError> {
        (**self).send(address, method, args).await
    }
}
