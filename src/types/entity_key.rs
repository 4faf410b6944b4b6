// ABOUTME: Stable keys identifying deployed entities in the receipt store.
// ABOUTME: Keys derive only from configured type codes, never from runtime values.

use std::fmt;

use serde::Serialize;

use super::TypeCode;

/// Composite identifier (stage name plus scoping type codes) of one entity.
///
/// Keys render as `xcoin`, `list-lib`, `banks`, `bank-<bank>`,
/// `bank-account-<bank>-<account>` and `bank-service-<bank>-<service>`, which
/// matches the receipt file names of earlier deployments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub fn base_currency() -> Self {
        Self("xcoin".to_string())
    }

    pub fn library() -> Self {
        Self("list-lib".to_string())
    }

    pub fn registry() -> Self {
        Self("banks".to_string())
    }

    pub fn bank(bank: &TypeCode) -> Self {
        Self(format!("bank-{bank}"))
    }

    pub fn bank_account(bank: &TypeCode, account: &TypeCode) -> Self {
        Self(format!("bank-account-{bank}-{account}"))
    }

    pub fn bank_service(bank: &TypeCode, service: &TypeCode) -> Self {
        Self(format!("bank-service-{bank}-{service}"))
    }

    /// Prefix shared by every account key of one bank.
    pub fn bank_accounts_prefix(bank: &TypeCode) -> String {
        format!("bank-account-{bank}-")
    }

    /// Prefix shared by every service key of one bank.
    pub fn bank_services_prefix(bank: &TypeCode) -> String {
        format!("bank-service-{bank}-")
    }

    /// Rebuild a key from its stored form (a receipt file stem).
    ///
    /// Returns `None` for names that could not have been produced by one of the
    /// constructors above.
    pub fn from_stored(name: &str) -> Option<Self> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        valid.then(|| Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}
