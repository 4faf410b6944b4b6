// ABOUTME: Durable receipt persistence keyed by entity.
// ABOUTME: A receipt is written once per key and is the sole proof an entity exists.

mod error;
mod file;
mod memory;
mod receipt;

pub use error::StoreError;
pub use file::FileReceiptStore;
pub use memory::MemoryReceiptStore;
pub use receipt::{ContractRecord, DeploymentReceipt, ResourceCost};

use crate::types::EntityKey;

/// Put-once key-value persistence for deployment receipts.
///
/// There is no update or delete: once `put` returns, the receipt is durable and
/// every later `put` for the same key fails with [`StoreError::AlreadyExists`].
pub trait ReceiptStore: Send + Sync {
    /// Whether a receipt exists for `key`.
    fn has(&self, key: &EntityKey) -> bool;

    /// Load the receipt for `key`, failing with [`StoreError::NotFound`] if absent.
    fn get(&self, key: &EntityKey) -> Result<DeploymentReceipt, StoreError>;

    /// Persist a receipt. Durable before it returns.
    fn put(&self, key: &EntityKey, receipt: &DeploymentReceipt) -> Result<(), StoreError>;

    /// All receipts whose key starts with `prefix`, ordered by key.
    fn list(&self, prefix: &str) -> Result<Vec<(EntityKey, DeploymentReceipt)>, StoreError>;

    /// Like [`ReceiptStore::get`], with a miss mapped to `None`.
    fn find(&self, key: &EntityKey) -> Result<Option<DeploymentReceipt>, StoreError> {
        match self.get(key) {
            Ok(receipt) => Ok(Some(receipt)),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
