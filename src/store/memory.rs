// ABOUTME: In-memory receipt store for tests and dry runs.
// ABOUTME: Same put-once contract as the file store, nothing survives the process.

use parking_lot::Mutex;
use std::collections::BTreeMap;

use super::{DeploymentReceipt, ReceiptStore, StoreError};
use crate::types::EntityKey;

#[derive(Debug, Default)]
pub struct MemoryReceiptStore {
    receipts: Mutex<BTreeMap<EntityKey, DeploymentReceipt>>,
}

impl MemoryReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.receipts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.lock().is_empty()
    }

    /// Every stored key, in order.
    pub fn keys(&self) -> Vec<EntityKey> {
        self.receipts.lock().keys().cloned().collect()
    }
}

impl ReceiptStore for MemoryReceiptStore {
    fn has(&self, key: &EntityKey) -> bool {
        self.receipts.lock().contains_key(key)
    }

    fn get(&self, key: &EntityKey) -> Result<DeploymentReceipt, StoreError> {
        self.receipts
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    fn put(&self, key: &EntityKey, receipt: &DeploymentReceipt) -> Result<(), StoreError> {
        let mut receipts = self.receipts.lock();
        if receipts.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.clone()));
        }
        receipts.insert(key.clone(), receipt.clone());
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<(EntityKey, DeploymentReceipt)>, StoreError> {
        Ok(self
            .receipts
            .lock()
            .iter()
            .filter(|(key, _)| key.as_str().starts_with(prefix))
            .map(|(key, receipt)| (key.clone(), receipt.clone()))
            .collect())
    }
}
