// ABOUTME: Configuration types and parsing for the deployment pipeline.
// ABOUTME: Handles YAML/JSON parsing, discovery, and validation.

mod bank;
mod deserialize;
mod exchange_rate;
mod init;

pub use bank::{AccountConfig, BankConfig, BaseCurrencyConfig, RegistryConfig, ServiceConfig};
pub use exchange_rate::{ExchangeRate, RateColumns};
pub use init::init_config;

use crate::error::{Error, Result};
use crate::types::{EntityKey, TokenAmount, TypeCode};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "banksmith.yml";
pub const CONFIG_FILENAME_ALT: &str = "banksmith.yaml";
pub const CONFIG_FILENAME_JSON: &str = "config.json";

/// Directory, relative to the config file, holding receipts by default.
pub const DEFAULT_STATE_DIR: &str = "deployments";

/// Complete deployment configuration, loaded once and never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_currency: BaseCurrencyConfig,
    pub registry: RegistryConfig,
    pub exchange_rates: Vec<ExchangeRate>,
    pub banks: Vec<BankConfig>,
    pub deploy: DeploySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploySettings {
    /// Upper bound on each deployer call.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Entities of one stage processed at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_concurrency() -> usize {
    1
}

/// On-disk shape. Older files carry the registry fields at the top level.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(alias = "xCoin")]
    base_currency: BaseCurrencyConfig,
    #[serde(default)]
    registry: Option<RegistryConfig>,
    #[serde(default)]
    type_code: Option<TypeCode>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    exchange_rates: Vec<ExchangeRate>,
    #[serde(default)]
    banks: Vec<BankConfig>,
    #[serde(default)]
    deploy: DeploySettings,
}

impl TryFrom<RawConfig> for Config {
    type Error = String;

    fn try_from(raw: RawConfig) -> std::result::Result<Self, Self::Error> {
        let registry = match (raw.registry, raw.type_code) {
            (Some(registry), _) => registry,
            (None, Some(type_code)) => RegistryConfig {
                type_code,
                label: raw
                    .label
                    .ok_or_else(|| "missing field `registry.label`".to_string())?,
                description: raw.description.unwrap_or_default(),
            },
            (None, None) => return Err("missing field `registry`".to_string()),
        };

        Ok(Config {
            base_currency: raw.base_currency,
            registry,
            exchange_rates: raw.exchange_rates,
            banks: raw.banks,
            deploy: raw.deploy,
        })
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawConfig::deserialize(deserializer)?;
        Config::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Config {
    /// Parse and validate a configuration document (YAML or JSON).
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find the configuration file in `dir`.
    pub fn locate(dir: &Path) -> Result<PathBuf> {
        [CONFIG_FILENAME, CONFIG_FILENAME_ALT, CONFIG_FILENAME_JSON]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        Self::load(&Self::locate(dir)?)
    }

    /// Reject configurations that would produce colliding keys or unusable stages.
    pub fn validate(&self) -> Result<()> {
        if self.deploy.concurrency == 0 {
            return Err(Error::InvalidConfig(
                "deploy.concurrency must be at least 1".to_string(),
            ));
        }

        for rate in &self.exchange_rates {
            if rate.source_currency == rate.target_currency {
                return Err(Error::InvalidConfig(format!(
                    "exchange rate converts {} into itself",
                    rate.source_currency
                )));
            }
        }

        self.check_receipt_keys()?;

        let mut banks = HashSet::new();
        for bank in &self.banks {
            if !banks.insert(&bank.type_code) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate bank type code: {}",
                    bank.type_code
                )));
            }

            let mut accounts = HashSet::new();
            for account in &bank.accounts {
                if !accounts.insert(&account.type_code) {
                    return Err(Error::InvalidConfig(format!(
                        "duplicate account type code {} in bank {}",
                        account.type_code, bank.type_code
                    )));
                }
            }
        }

        Ok(())
    }

    /// Type codes may contain `-`, so distinct entities can still render the
    /// same receipt key (bank `A-B` account `C` against bank `A` account `B-C`).
    fn check_receipt_keys(&self) -> Result<()> {
        let mut keys: HashMap<EntityKey, String> = HashMap::new();
        let mut claim = |key: EntityKey, owner: String| {
            if let Some(first) = keys.get(&key) {
                if *first != owner {
                    return Err(Error::InvalidConfig(format!(
                        "{first} and {owner} both use receipt key {key}"
                    )));
                }
            }
            keys.insert(key, owner);
            Ok(())
        };

        for bank in &self.banks {
            claim(EntityKey::bank(&bank.type_code), format!("bank {}", bank.type_code))?;
            for account in &bank.accounts {
                claim(
                    EntityKey::bank_account(&bank.type_code, &account.type_code),
                    format!("account {} of bank {}", account.type_code, bank.type_code),
                )?;
            }
            for service in bank.services.keys() {
                claim(
                    EntityKey::bank_service(&bank.type_code, service),
                    format!("service {} of bank {}", service, bank.type_code),
                )?;
            }
        }
        Ok(())
    }

    /// Holder identifiers configured for auto-registration, de-duplicated in
    /// first-seen order.
    pub fn auto_register_holders(&self) -> Vec<&str> {
        let mut holders = indexmap::IndexSet::new();
        for account in self.banks.iter().flat_map(|bank| &bank.accounts) {
            for holder in &account.auto_registers {
                holders.insert(holder.as_str());
            }
        }
        holders.into_iter().collect()
    }

    pub fn template() -> Self {
        let code = |s: &str| TypeCode::new(s).expect("template type codes are valid");

        Config {
            base_currency: BaseCurrencyConfig {
                type_code: code("XCOIN"),
                label: "Exchange Coin".to_string(),
                description: "Settlement currency shared by all banks".to_string(),
                symbol: "XCN".to_string(),
                initial_supply: TokenAmount::from(1_000_000),
                decimals: 2,
                currency_code: "XCN".to_string(),
            },
            registry: RegistryConfig {
                type_code: code("BANKS"),
                label: "Banks".to_string(),
                description: "Bank registry".to_string(),
            },
            exchange_rates: vec![],
            banks: vec![BankConfig {
                type_code: code("BANK1"),
                label: "First Bank".to_string(),
                description: String::new(),
                country_code: "US".to_string(),
                accounts: vec![],
                services: Default::default(),
            }],
            deploy: DeploySettings::default(),
        }
    }
}
