// ABOUTME: Contract catalogue and the argument values passed to contracts.
// ABOUTME: Maps service type codes to service contracts and names registry methods.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::{Address, TokenAmount, TypeCode};

/// Method names called on deployed contracts.
pub mod methods {
    pub const REGISTERED_BANK: &str = "registeredBank";
    pub const ADD_BANK: &str = "addBank";
    pub const REGISTERED_ACCOUNT: &str = "registeredAccount";
    pub const ADD_ACCOUNT: &str = "addAccount";
    pub const REGISTERED_SERVICE: &str = "registeredService";
    pub const ADD_SERVICE: &str = "addService";
    pub const REGISTER_ACCOUNT_BY_OWNER: &str = "registerAccountByOwner";
    pub const GET_PANS: &str = "getPANs";
}

/// Compiled contracts the pipeline knows how to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    XCoin,
    ListLib,
    Banks,
    Bank,
    BankAccount,
    #[serde(rename = "BSTransfer")]
    Transfer,
    #[serde(rename = "BSPayroll")]
    Payroll,
    #[serde(rename = "BSRetail")]
    Retail,
    #[serde(rename = "BSTravelInsurance")]
    TravelInsurance,
}

impl ArtifactKind {
    /// Contract name as compiled.
    pub fn contract_name(&self) -> &'static str {
        match self {
            ArtifactKind::XCoin => "XCoin",
            ArtifactKind::ListLib => "ListLib",
            ArtifactKind::Banks => "Banks",
            ArtifactKind::Bank => "Bank",
            ArtifactKind::BankAccount => "BankAccount",
            ArtifactKind::Transfer => "BSTransfer",
            ArtifactKind::Payroll => "BSPayroll",
            ArtifactKind::Retail => "BSRetail",
            ArtifactKind::TravelInsurance => "BSTravelInsurance",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.contract_name())
    }
}

/// Bank services with a compiled contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Transfer,
    Payroll,
    Retail,
    TravelInsurance,
}

impl ServiceKind {
    /// Resolve a configured service type code; `None` for unknown services.
    pub fn from_type_code(code: &TypeCode) -> Option<Self> {
        match code.as_str() {
            "TRANSFER" => Some(ServiceKind::Transfer),
            "PAYROLL" => Some(ServiceKind::Payroll),
            "RETAIL" => Some(ServiceKind::Retail),
            "TRAVEL_INSURANCE" => Some(ServiceKind::TravelInsurance),
            _ => None,
        }
    }

    pub fn artifact(&self) -> ArtifactKind {
        match self {
            ServiceKind::Transfer => ArtifactKind::Transfer,
            ServiceKind::Payroll => ArtifactKind::Payroll,
            ServiceKind::Retail => ArtifactKind::Retail,
            ServiceKind::TravelInsurance => ArtifactKind::TravelInsurance,
        }
    }
}

/// A value passed to or returned from a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Arg {
    Address(Address),
    String(String),
    Uint(TokenAmount),
    Decimal(Decimal),
    Bool(bool),
    Array(Vec<Arg>),
}

impl Arg {
    pub fn text(value: impl Into<String>) -> Self {
        Arg::String(value.into())
    }

    pub fn texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arg::Array(values.into_iter().map(Arg::text).collect())
    }

    pub fn decimals(values: &[Decimal]) -> Self {
        Arg::Array(values.iter().copied().map(Arg::Decimal).collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Arg::Address(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a string array; `None` if any element is not a string.
    pub fn as_texts(&self) -> Option<Vec<String>> {
        match self {
            Arg::Array(items) => items
                .iter()
                .map(|item| item.as_text().map(str::to_string))
                .collect(),
            _ => None,
        }
    }
}

/// Contract code reference plus constructor arguments and library links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "contract")]
    pub kind: ArtifactKind,
    pub args: Vec<Arg>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub libraries: BTreeMap<String, Address>,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, args: Vec<Arg>) -> Self {
        Self {
            kind,
            args,
            libraries: BTreeMap::new(),
        }
    }

    /// Link a deployed library into this contract's code.
    pub fn link(mut self, library: ArtifactKind, address: Address) -> Self {
        self.libraries
            .insert(library.contract_name().to_string(), address);
        self
    }
}
