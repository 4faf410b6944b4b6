// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to keep addresses and transaction hashes apart.

mod amount;
mod entity_key;
mod id;
mod type_code;

pub use amount::{AmountError, TokenAmount};
pub use entity_key::EntityKey;
pub use id::{Address, Id, TxHash};
pub use type_code::{TypeCode, TypeCodeError};
