// ABOUTME: The deployable entities of a pipeline and what each one needs.
// ABOUTME: Builds constructor arguments, registration edges and source configuration.

use std::collections::BTreeMap;

use serde_json::Value;

use super::StageError;
use crate::config::{
    AccountConfig, BankConfig, BaseCurrencyConfig, ExchangeRate, RateColumns, RegistryConfig,
    ServiceConfig,
};
use crate::deployer::{Arg, Artifact, ArtifactKind, ServiceKind, methods};
use crate::store::DeploymentReceipt;
use crate::types::{Address, EntityKey, TokenAmount, TypeCode};

/// One contract the pipeline deploys, borrowing its configuration.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'c> {
    BaseCurrency {
        conf: &'c BaseCurrencyConfig,
        rates: &'c [ExchangeRate],
    },
    Library,
    Registry {
        conf: &'c RegistryConfig,
    },
    Bank {
        conf: &'c BankConfig,
    },
    BankAccount {
        bank: &'c BankConfig,
        conf: &'c AccountConfig,
        rates: &'c [ExchangeRate],
    },
    BankService {
        bank: &'c BankConfig,
        type_code: &'c TypeCode,
        kind: ServiceKind,
        conf: &'c ServiceConfig,
    },
}

/// A child-to-parent registration: `query(child)` answers whether `register(child)`
/// has already been sent to the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEdge {
    pub parent: EntityKey,
    pub query: &'static str,
    pub register: &'static str,
}

/// Receipts of the entities another entity depends on.
#[derive(Debug, Default)]
pub struct Parents {
    receipts: BTreeMap<EntityKey, DeploymentReceipt>,
}

impl Parents {
    pub fn insert(&mut self, key: EntityKey, receipt: DeploymentReceipt) {
        self.receipts.insert(key, receipt);
    }

    pub fn address(&self, key: &EntityKey) -> Option<&Address> {
        self.receipts.get(key).map(DeploymentReceipt::address)
    }
}

impl<'c> Entity<'c> {
    pub fn key(&self) -> EntityKey {
        match self {
            Entity::BaseCurrency { .. } => EntityKey::base_currency(),
            Entity::Library => EntityKey::library(),
            Entity::Registry { .. } => EntityKey::registry(),
            Entity::Bank { conf } => EntityKey::bank(&conf.type_code),
            Entity::BankAccount { bank, conf, .. } => {
                EntityKey::bank_account(&bank.type_code, &conf.type_code)
            }
            Entity::BankService {
                bank, type_code, ..
            } => EntityKey::bank_service(&bank.type_code, type_code),
        }
    }

    pub fn artifact_kind(&self) -> ArtifactKind {
        match self {
            Entity::BaseCurrency { .. } => ArtifactKind::XCoin,
            Entity::Library => ArtifactKind::ListLib,
            Entity::Registry { .. } => ArtifactKind::Banks,
            Entity::Bank { .. } => ArtifactKind::Bank,
            Entity::BankAccount { .. } => ArtifactKind::BankAccount,
            Entity::BankService { kind, .. } => kind.artifact(),
        }
    }

    /// Human-readable label used in logs and progress output.
    pub fn describe(&self) -> String {
        match self {
            Entity::BaseCurrency { conf, .. } => format!("{} ({})", conf.label, conf.type_code),
            Entity::Library => ArtifactKind::ListLib.contract_name().to_string(),
            Entity::Registry { conf } => format!("{} ({})", conf.label, conf.type_code),
            Entity::Bank { conf } => format!("{} ({})", conf.label, conf.type_code),
            Entity::BankAccount { bank, conf, .. } => {
                format!("{} ({}) of bank {}", conf.label, conf.type_code, bank.type_code)
            }
            Entity::BankService {
                bank,
                type_code,
                conf,
                ..
            } => format!("{} ({}) of bank {}", conf.label, type_code, bank.type_code),
        }
    }

    /// Keys whose receipts must exist before this entity can be ensured.
    pub fn requires(&self) -> Vec<EntityKey> {
        match self {
            Entity::BaseCurrency { .. } | Entity::Library => vec![],
            Entity::Registry { .. } => vec![EntityKey::base_currency(), EntityKey::library()],
            Entity::Bank { .. } => vec![EntityKey::registry()],
            Entity::BankAccount { bank, conf, .. } => {
                let mut keys = vec![EntityKey::bank(&bank.type_code)];
                if !conf.auto_registers.is_empty() {
                    keys.push(EntityKey::registry());
                }
                keys
            }
            Entity::BankService { bank, .. } => vec![EntityKey::bank(&bank.type_code)],
        }
    }

    /// Registrations this entity must have with its parents.
    pub fn edges(&self) -> Vec<RegistrationEdge> {
        match self {
            Entity::BaseCurrency { .. } | Entity::Library | Entity::Registry { .. } => vec![],
            Entity::Bank { .. } => vec![RegistrationEdge {
                parent: EntityKey::registry(),
                query: methods::REGISTERED_BANK,
                register: methods::ADD_BANK,
            }],
            Entity::BankAccount { bank, .. } => vec![RegistrationEdge {
                parent: EntityKey::bank(&bank.type_code),
                query: methods::REGISTERED_ACCOUNT,
                register: methods::ADD_ACCOUNT,
            }],
            Entity::BankService { bank, .. } => vec![RegistrationEdge {
                parent: EntityKey::bank(&bank.type_code),
                query: methods::REGISTERED_SERVICE,
                register: methods::ADD_SERVICE,
            }],
        }
    }

    /// Holder identifiers to register against this entity once it exists.
    pub fn holders(&self) -> &'c [String] {
        match self {
            Entity::BankAccount { conf, .. } => &conf.auto_registers,
            _ => &[],
        }
    }

    /// Contract code and constructor arguments, with parent addresses filled in.
    pub fn artifact(&self, parents: &Parents) -> Result<Artifact, StageError> {
        let parent = |key: EntityKey| -> Result<Arg, StageError> {
            parents
                .address(&key)
                .cloned()
                .map(Arg::Address)
                .ok_or_else(|| StageError::MissingDependency {
                    needed_by: self.key().to_string(),
                    dependency: key,
                })
        };

        let artifact = match self {
            Entity::BaseCurrency { conf, rates } => {
                let mut args = vec![
                    Arg::text(conf.type_code.as_str()),
                    Arg::text(&conf.label),
                    Arg::text(&conf.description),
                    Arg::text(&conf.symbol),
                    Arg::Uint(conf.initial_supply.clone()),
                    Arg::Uint(TokenAmount::from(u64::from(conf.decimals))),
                    Arg::text(&conf.currency_code),
                ];
                args.extend(rate_args(rates));
                Artifact::new(ArtifactKind::XCoin, args)
            }
            Entity::Library => Artifact::new(ArtifactKind::ListLib, vec![]),
            Entity::Registry { conf } => {
                let library = parents.address(&EntityKey::library()).cloned().ok_or_else(|| {
                    StageError::MissingDependency {
                        needed_by: self.key().to_string(),
                        dependency: EntityKey::library(),
                    }
                })?;
                let args = vec![
                    parent(EntityKey::base_currency())?,
                    Arg::text(conf.type_code.as_str()),
                    Arg::text(&conf.label),
                    Arg::text(&conf.description),
                ];
                Artifact::new(ArtifactKind::Banks, args).link(ArtifactKind::ListLib, library)
            }
            Entity::Bank { conf } => Artifact::new(
                ArtifactKind::Bank,
                vec![
                    parent(EntityKey::registry())?,
                    Arg::text(conf.type_code.as_str()),
                    Arg::text(&conf.label),
                    Arg::text(&conf.description),
                    Arg::text(&conf.country_code),
                ],
            ),
            Entity::BankAccount { bank, conf, rates } => {
                let mut args = vec![
                    parent(EntityKey::bank(&bank.type_code))?,
                    Arg::text(conf.type_code.as_str()),
                    Arg::text(&conf.label),
                    Arg::text(&conf.description),
                    Arg::text(&conf.symbol),
                    Arg::Uint(conf.initial_supply.clone()),
                    Arg::Uint(TokenAmount::from(u64::from(conf.decimals))),
                    Arg::text(&conf.currency_code),
                    Arg::text(&conf.bin),
                ];
                args.extend(rate_args(rates));
                Artifact::new(ArtifactKind::BankAccount, args)
            }
            Entity::BankService {
                bank, kind, conf, ..
            } => Artifact::new(
                kind.artifact(),
                vec![
                    parent(EntityKey::bank(&bank.type_code))?,
                    Arg::text(&conf.label),
                    Arg::text(&conf.description),
                ],
            ),
        };

        Ok(artifact)
    }

    /// The configuration recorded alongside the receipt.
    pub fn source_conf(&self) -> Result<Value, StageError> {
        let encoded = match self {
            Entity::BaseCurrency { conf, rates } => serde_json::to_value(conf)
                .and_then(|v| Ok(with_field(v, "exchangeRates", serde_json::to_value(rates)?))),
            Entity::Library => Ok(serde_json::json!({
                "contract": ArtifactKind::ListLib.contract_name(),
            })),
            Entity::Registry { conf } => serde_json::to_value(conf),
            Entity::Bank { conf } => serde_json::to_value(conf),
            Entity::BankAccount { conf, rates, .. } => serde_json::to_value(conf)
                .and_then(|v| Ok(with_field(v, "exchangeRates", serde_json::to_value(rates)?))),
            Entity::BankService {
                type_code, conf, ..
            } => serde_json::to_value(conf)
                .map(|v| with_field(v, "typeCode", Value::String(type_code.to_string()))),
        };

        encoded.map_err(|source| StageError::Encode {
            key: self.key(),
            source,
        })
    }
}

/// The parallel source, target and rate arrays of a rate-bearing constructor.
fn rate_args(rates: &[ExchangeRate]) -> [Arg; 3] {
    let columns = RateColumns::project(rates);
    [
        Arg::texts(columns.source_currencies),
        Arg::texts(columns.target_currencies),
        Arg::decimals(&columns.rates),
    ]
}

fn with_field(mut value: Value, field: &str, extra: Value) -> Value {
    if let Value::Object(map) = &mut value {
        map.insert(field.to_string(), extra);
    }
    value
}
