// ABOUTME: Validated type codes for banks, accounts, services, and currencies.
// ABOUTME: Type codes end up in receipt file names, so the character set is restricted.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum TypeCodeError {
    #[error("type code cannot be empty")]
    Empty,

    #[error("type code exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("invalid character in type code: '{0}'")]
    InvalidChar(char),
}

/// Configuration-assigned code identifying an entity (`BNK01`, `TRANSFER`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeCode(String);

impl TypeCode {
    pub fn new(value: &str) -> Result<Self, TypeCodeError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TypeCodeError::Empty);
        }

        if value.len() > MAX_LEN {
            return Err(TypeCodeError::TooLong);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
        {
            return Err(TypeCodeError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TypeCode {
    type Error = TypeCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<TypeCode> for String {
    fn from(code: TypeCode) -> Self {
        code.0
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
