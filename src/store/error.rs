// ABOUTME: Error types for receipt store operations.
// ABOUTME: Distinguishes misses and put-once violations from I/O and decoding failures.

use crate::types::EntityKey;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No receipt recorded for the key. Callers treat this as "needs creation".
    #[error("no receipt for {0}")]
    NotFound(EntityKey),

    /// A receipt already exists; receipts are never overwritten.
    #[error("receipt for {0} already exists")]
    AlreadyExists(EntityKey),

    #[error("failed to access {target}: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("receipt {key} is corrupt: {source}")]
    Corrupt {
        key: EntityKey,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(target: impl std::fmt::Display, source: std::io::Error) -> Self {
        StoreError::Io {
            target: target.to_string(),
            source,
        }
    }
}
