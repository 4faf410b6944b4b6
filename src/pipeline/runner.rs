// ABOUTME: Idempotent execution of one stage: create, skip or reconcile each entity.
// ABOUTME: Entities run in waves bounded by the configured concurrency.

use futures::future::join_all;
use serde::Serialize;

use super::{Entity, Parents, Progress, Stage, StageError};
use crate::deployer::{Arg, Deployer, methods};
use crate::store::{DeploymentReceipt, ReceiptStore};
use crate::types::{Address, EntityKey};

/// What ensuring an entity did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityAction {
    /// Deployed now and its receipt recorded.
    Created,
    /// Already deployed; a missing registration was repaired.
    Reconciled,
    /// Already deployed and fully registered.
    Skipped,
}

/// The result of ensuring one entity.
#[derive(Debug, Clone)]
pub struct EntityOutcome {
    pub key: EntityKey,
    pub description: String,
    pub receipt: DeploymentReceipt,
    pub action: EntityAction,
    /// Registration edges that had to be closed on this run.
    pub registrations: usize,
    /// Holder registrations sent on this run.
    pub holders_registered: usize,
}

/// Runs stages against one deployer and one receipt store.
pub struct StageRunner<'a> {
    deployer: &'a dyn Deployer,
    store: &'a dyn ReceiptStore,
    concurrency: usize,
}

impl<'a> StageRunner<'a> {
    pub fn new(deployer: &'a dyn Deployer, store: &'a dyn ReceiptStore) -> Self {
        Self {
            deployer,
            store,
            concurrency: 1,
        }
    }

    /// Entities processed at once. Zero is treated as one.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Ensure every entity of `stage`.
    ///
    /// Entities run in waves of `concurrency`. When a wave contains a failure,
    /// the wave finishes and no further wave starts; the first error is
    /// returned.
    pub async fn run(
        &self,
        stage: &Stage<'_>,
        progress: &dyn Progress,
    ) -> Result<Vec<EntityOutcome>, StageError> {
        let mut outcomes = Vec::with_capacity(stage.entities.len());

        for wave in stage.entities.chunks(self.concurrency) {
            let results = join_all(wave.iter().map(|entity| self.ensure(entity))).await;

            let mut failure = None;
            for result in results {
                match result {
                    Ok(outcome) => {
                        progress.entity_resolved(stage.kind, &outcome);
                        outcomes.push(outcome);
                    }
                    Err(e) if failure.is_none() => failure = Some(e),
                    Err(e) => tracing::error!("Additional failure in stage {}: {}", stage.kind, e),
                }
            }

            if let Some(e) = failure {
                return Err(e);
            }
        }

        Ok(outcomes)
    }

    /// Bring one entity to its deployed and registered state.
    pub async fn ensure(&self, entity: &Entity<'_>) -> Result<EntityOutcome, StageError> {
        let key = entity.key();
        let parents = self.resolve_parents(entity)?;

        let (receipt, created) = match self.store.find(&key)? {
            Some(receipt) => {
                tracing::info!(
                    "Skipping {}, already deployed at {}",
                    entity.describe(),
                    receipt.address()
                );
                (receipt, false)
            }
            None => (self.create(entity, &key, &parents).await?, true),
        };

        let registrations = self.close_edges(entity, receipt.address(), &parents).await?;
        let holders_registered = self
            .register_holders(entity, receipt.address(), &parents)
            .await?;

        let action = match (created, registrations) {
            (true, _) => EntityAction::Created,
            (false, 0) => EntityAction::Skipped,
            (false, _) => EntityAction::Reconciled,
        };

        Ok(EntityOutcome {
            key,
            description: entity.describe(),
            receipt,
            action,
            registrations,
            holders_registered,
        })
    }

    fn resolve_parents(&self, entity: &Entity<'_>) -> Result<Parents, StageError> {
        let mut parents = Parents::default();
        for dependency in entity.requires() {
            match self.store.find(&dependency)? {
                Some(receipt) => parents.insert(dependency, receipt),
                None => {
                    return Err(StageError::MissingDependency {
                        needed_by: entity.key().to_string(),
                        dependency,
                    });
                }
            }
        }
        Ok(parents)
    }

    async fn create(
        &self,
        entity: &Entity<'_>,
        key: &EntityKey,
        parents: &Parents,
    ) -> Result<DeploymentReceipt, StageError> {
        let artifact = entity.artifact(parents)?;
        let conf = entity.source_conf()?;

        tracing::info!("Deploying {} as {}", entity.describe(), artifact.kind);
        let deployed = self.deployer.deploy(&artifact).await.map_err(|source| {
            StageError::DeploymentFailed {
                key: key.clone(),
                source,
            }
        })?;

        let receipt = DeploymentReceipt::from_deployed(deployed, conf);
        if let Err(source) = self.store.put(key, &receipt) {
            tracing::error!(
                "{} was deployed at {} but recording its receipt failed",
                key,
                receipt.address()
            );
            return Err(StageError::Unrecorded {
                key: key.clone(),
                address: receipt.address().clone(),
                source,
            });
        }

        tracing::info!(
            "  {} deployed at {} (gas used {})",
            key,
            receipt.address(),
            receipt.contract.gas_used
        );
        Ok(receipt)
    }

    /// Query each parent and register where missing. Returns the number of
    /// registrations sent.
    async fn close_edges(
        &self,
        entity: &Entity<'_>,
        child: &Address,
        parents: &Parents,
    ) -> Result<usize, StageError> {
        let key = entity.key();
        let mut closed = 0;

        for edge in entity.edges() {
            let parent = parents
                .address(&edge.parent)
                .ok_or_else(|| StageError::MissingDependency {
                    needed_by: key.to_string(),
                    dependency: edge.parent.clone(),
                })?;
            let args = [Arg::Address(child.clone())];

            let answer = self
                .deployer
                .call(parent, edge.query, &args)
                .await
                .map_err(|source| StageError::QueryFailed {
                    key: key.clone(),
                    method: edge.query,
                    source,
                })?;
            let registered = answer
                .as_bool()
                .ok_or_else(|| StageError::UnexpectedResponse {
                    key: key.to_string(),
                    method: edge.query,
                    detail: format!("expected a boolean, got {answer:?}"),
                })?;

            if registered {
                tracing::debug!("{} already registered with {}", key, edge.parent);
                continue;
            }

            tracing::info!("Registering {} with {} via {}", key, edge.parent, edge.register);
            self.deployer
                .send(parent, edge.register, &args)
                .await
                .map_err(|source| StageError::TransactionFailed {
                    key: key.clone(),
                    method: edge.register,
                    source,
                })?;
            closed += 1;
        }

        Ok(closed)
    }

    /// Register each configured holder against the account, one call per holder.
    async fn register_holders(
        &self,
        entity: &Entity<'_>,
        account: &Address,
        parents: &Parents,
    ) -> Result<usize, StageError> {
        let holders = entity.holders();
        if holders.is_empty() {
            return Ok(0);
        }

        let key = entity.key();
        let registry_key = EntityKey::registry();
        let registry =
            parents
                .address(&registry_key)
                .ok_or_else(|| StageError::MissingDependency {
                    needed_by: key.to_string(),
                    dependency: registry_key.clone(),
                })?;

        for holder in holders {
            tracing::info!("  + Registering holder {} for {}", holder, key);
            let args = [Arg::texts([holder.as_str()]), Arg::Address(account.clone())];
            self.deployer
                .send(registry, methods::REGISTER_ACCOUNT_BY_OWNER, &args)
                .await
                .map_err(|source| StageError::TransactionFailed {
                    key: key.clone(),
                    method: methods::REGISTER_ACCOUNT_BY_OWNER,
                    source,
                })?;
        }

        Ok(holders.len())
    }
}
