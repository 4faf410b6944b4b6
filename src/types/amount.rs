// ABOUTME: Unsigned 256-bit token amounts, kept as canonical decimal digits.
// ABOUTME: Small values travel as JSON numbers, larger ones as digit strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const UINT256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount cannot be empty")]
    Empty,

    #[error("invalid character in amount: '{0}'")]
    InvalidChar(char),

    #[error("amount exceeds the uint256 range")]
    Overflow,
}

/// A non-negative integer up to 2^256 - 1 (initial supplies, decimals).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenAmount(String);

impl TokenAmount {
    pub fn new(value: &str) -> Result<Self, AmountError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(AmountError::Empty);
        }
        if let Some(c) = value.chars().find(|c| !c.is_ascii_digit()) {
            return Err(AmountError::InvalidChar(c));
        }

        let digits = value.trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        if digits.len() > UINT256_MAX.len()
            || (digits.len() == UINT256_MAX.len() && digits > UINT256_MAX)
        {
            return Err(AmountError::Overflow);
        }

        Ok(Self(digits.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value as a `u64`, when it fits.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_u64() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AmountEntry {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match AmountEntry::deserialize(deserializer)? {
            AmountEntry::Number(n) => Ok(Self::from(n)),
            AmountEntry::Text(s) => Self::new(&s).map_err(serde::de::Error::custom),
        }
    }
}
