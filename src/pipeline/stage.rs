// ABOUTME: Stage kinds, the ordered pipeline plan, and its static validation.
// ABOUTME: Planning expands configuration into entities; it never touches the ledger.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::{Entity, PipelineError};
use crate::config::Config;
use crate::deployer::ServiceKind;
use crate::diagnostics::{Diagnostics, Warning};
use crate::store::{ReceiptStore, StoreError};
use crate::types::{Address, EntityKey};

/// The fixed steps of a deployment, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    BaseCurrency,
    Library,
    Registry,
    Banks,
    BankAccounts,
    BankServices,
    Holders,
}

impl StageKind {
    pub const ORDER: [StageKind; 7] = [
        StageKind::BaseCurrency,
        StageKind::Library,
        StageKind::Registry,
        StageKind::Banks,
        StageKind::BankAccounts,
        StageKind::BankServices,
        StageKind::Holders,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::BaseCurrency => "base-currency",
            StageKind::Library => "library",
            StageKind::Registry => "registry",
            StageKind::Banks => "banks",
            StageKind::BankAccounts => "bank-accounts",
            StageKind::BankServices => "bank-services",
            StageKind::Holders => "holders",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One planned stage and the entities it ensures.
#[derive(Debug, Clone)]
pub struct Stage<'c> {
    pub kind: StageKind,
    pub entities: Vec<Entity<'c>>,
    /// Receipts the stage reads without producing them.
    pub requires: Vec<EntityKey>,
}

impl<'c> Stage<'c> {
    pub fn new(kind: StageKind, entities: Vec<Entity<'c>>) -> Self {
        let mut seen = HashSet::new();
        let requires = entities
            .iter()
            .flat_map(Entity::requires)
            .filter(|key| seen.insert(key.clone()))
            .collect();
        Self {
            kind,
            entities,
            requires,
        }
    }

    /// Keys of the entities this stage produces.
    pub fn produces(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.entities.iter().map(Entity::key)
    }
}

/// Whether one planned entity has a receipt yet.
#[derive(Debug, Clone, Serialize)]
pub struct EntityStatus {
    pub stage: StageKind,
    pub key: EntityKey,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

impl EntityStatus {
    pub fn is_deployed(&self) -> bool {
        self.address.is_some()
    }
}

/// The full ordered plan for one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline<'c> {
    stages: Vec<Stage<'c>>,
    holders: Vec<&'c str>,
}

impl<'c> Pipeline<'c> {
    /// Expand a configuration into the fixed stage order.
    ///
    /// Services without a known contract are reported to `diagnostics` and left
    /// out of the plan.
    pub fn plan(config: &'c Config, diagnostics: &mut Diagnostics) -> Self {
        let rates = config.exchange_rates.as_slice();

        let mut accounts = Vec::new();
        let mut services = Vec::new();
        for bank in &config.banks {
            accounts.extend(bank.accounts.iter().map(|conf| Entity::BankAccount {
                bank,
                conf,
                rates,
            }));

            for (type_code, conf) in &bank.services {
                match ServiceKind::from_type_code(type_code) {
                    Some(kind) => services.push(Entity::BankService {
                        bank,
                        type_code,
                        kind,
                        conf,
                    }),
                    None => diagnostics.warn(Warning::unknown_service(format!(
                        "Bank {} lists unknown service {}; it will not be deployed",
                        bank.type_code, type_code
                    ))),
                }
            }
        }

        let holders = config.auto_register_holders();
        let mut holder_stage = Stage::new(StageKind::Holders, vec![]);
        if !holders.is_empty() {
            holder_stage.requires.push(EntityKey::registry());
        }

        let stages = vec![
            Stage::new(
                StageKind::BaseCurrency,
                vec![Entity::BaseCurrency {
                    conf: &config.base_currency,
                    rates,
                }],
            ),
            Stage::new(StageKind::Library, vec![Entity::Library]),
            Stage::new(
                StageKind::Registry,
                vec![Entity::Registry {
                    conf: &config.registry,
                }],
            ),
            Stage::new(
                StageKind::Banks,
                config.banks.iter().map(|conf| Entity::Bank { conf }).collect(),
            ),
            Stage::new(StageKind::BankAccounts, accounts),
            Stage::new(StageKind::BankServices, services),
            holder_stage,
        ];

        Self { stages, holders }
    }

    /// Build a pipeline from explicit stages, e.g. to run a subset.
    pub fn from_stages(stages: Vec<Stage<'c>>, holders: Vec<&'c str>) -> Self {
        Self { stages, holders }
    }

    /// Check that every stage only reads receipts produced by an earlier stage.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut produced: HashSet<EntityKey> = HashSet::new();
        for stage in &self.stages {
            if let Some(missing) = stage.requires.iter().find(|key| !produced.contains(*key)) {
                return Err(PipelineError::InvalidOrder {
                    stage: stage.kind,
                    dependency: missing.clone(),
                });
            }
            produced.extend(stage.produces());
        }
        Ok(())
    }

    pub fn stages(&self) -> &[Stage<'c>] {
        &self.stages
    }

    pub fn stage(&self, kind: StageKind) -> Option<&Stage<'c>> {
        self.stages.iter().find(|stage| stage.kind == kind)
    }

    /// Holder identifiers the final stage reports on.
    pub fn holders(&self) -> &[&'c str] {
        &self.holders
    }

    /// Number of entities across all stages.
    pub fn entity_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.entities.len()).sum()
    }

    /// Compare the plan with the receipts already recorded.
    pub fn status(&self, store: &dyn ReceiptStore) -> Result<Vec<EntityStatus>, StoreError> {
        let mut statuses = Vec::with_capacity(self.entity_count());
        for stage in &self.stages {
            for entity in &stage.entities {
                let key = entity.key();
                let address = store.find(&key)?.map(|receipt| receipt.contract.address);
                statuses.push(EntityStatus {
                    stage: stage.kind,
                    key,
                    description: entity.describe(),
                    address,
                });
            }
        }
        Ok(statuses)
    }

    /// Recorded receipts that no planned entity accounts for, such as accounts
    /// removed from the configuration after they were deployed.
    pub fn orphaned(&self, store: &dyn ReceiptStore) -> Result<Vec<EntityKey>, StoreError> {
        let planned: HashSet<EntityKey> = self.stages.iter().flat_map(|stage| stage.produces()).collect();
        Ok(store
            .list("")?
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| !planned.contains(key))
            .collect())
    }
}
