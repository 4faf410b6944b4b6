// ABOUTME: Deployment receipt: the durable record of one created entity.
// ABOUTME: JSON shape `{ contract: { address, gasUsed, transactionHash }, conf }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::deployer::Deployed;
use crate::types::{Address, TxHash};

/// Resource cost (gas) charged for a ledger operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceCost(pub u64);

impl fmt::Display for ResourceCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Written as a decimal string; older receipts may hold a bare number.
impl Serialize for ResourceCost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for ResourceCost {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Entry {
            Text(String),
            Number(u64),
        }

        match Entry::deserialize(deserializer)? {
            Entry::Number(n) => Ok(ResourceCost(n)),
            Entry::Text(s) => s
                .trim()
                .parse()
                .map(ResourceCost)
                .map_err(|_| serde::de::Error::custom(format!("invalid gas figure: {s}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub address: Address,
    pub gas_used: ResourceCost,
    pub transaction_hash: TxHash,
}

/// Proof that an entity was created, plus the configuration that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReceipt {
    pub contract: ContractRecord,
    #[serde(default)]
    pub conf: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
}

impl DeploymentReceipt {
    /// Build the receipt for a contract the deployer just created.
    pub fn from_deployed(deployed: Deployed, conf: serde_json::Value) -> Self {
        Self {
            contract: ContractRecord {
                address: deployed.address,
                gas_used: deployed.gas_used,
                transaction_hash: deployed.transaction_hash,
            },
            conf,
            deployed_at: Some(Utc::now()),
        }
    }

    pub fn address(&self) -> &Address {
        &self.contract.address
    }

    /// A string field of the echoed configuration, if present.
    pub fn conf_str(&self, field: &str) -> Option<&str> {
        self.conf.get(field).and_then(serde_json::Value::as_str)
    }
}
