// ABOUTME: Configuration for the entities deployed by the pipeline.
// ABOUTME: Base currency, registry, banks with their accounts and services.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::deserialize::string_or_number;
use crate::types::{TokenAmount, TypeCode};

/// The exchange coin every bank and account settles against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseCurrencyConfig {
    pub type_code: TypeCode,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub symbol: String,
    pub initial_supply: TokenAmount,
    pub decimals: u8,
    pub currency_code: String,
}

/// The top-level registry that banks and account holders register with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    pub type_code: TypeCode,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankConfig {
    pub type_code: TypeCode,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub country_code: String,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    /// Services keyed by service type code, in configuration order.
    #[serde(default)]
    pub services: IndexMap<TypeCode, ServiceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    pub type_code: TypeCode,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub symbol: String,
    pub initial_supply: TokenAmount,
    pub decimals: u8,
    pub currency_code: String,
    #[serde(rename = "BIN", deserialize_with = "string_or_number")]
    pub bin: String,
    /// Holders registered against the account after it exists.
    #[serde(default)]
    pub auto_registers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub label: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_bin_accepts_numbers() {
        let json = r#"{
            "typeCode": "EUR",
            "label": "Euro account",
            "symbol": "EUR",
            "initialSupply": 1000,
            "decimals": 2,
            "currencyCode": "EUR",
            "BIN": 412345
        }"#;
        let account: AccountConfig = serde_json::from_str(json).unwrap();
        assert_eq!(account.bin, "412345");
        assert!(account.auto_registers.is_empty());
        assert!(account.description.is_empty());
    }

    #[test]
    fn services_keep_configuration_order() {
        let json = r#"{
            "typeCode": "B1",
            "label": "Bank one",
            "countryCode": "US",
            "services": {
                "TRAVEL_INSURANCE": { "label": "Travel" },
                "TRANSFER": { "label": "Transfer" },
                "PAYROLL": { "label": "Payroll" }
            }
        }"#;
        let bank: BankConfig = serde_json::from_str(json).unwrap();
        let order: Vec<&str> = bank.services.keys().map(TypeCode::as_str).collect();
        assert_eq!(order, vec!["TRAVEL_INSURANCE", "TRANSFER", "PAYROLL"]);
    }
}
