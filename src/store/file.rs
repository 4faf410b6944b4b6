// ABOUTME: File-per-key receipt store, one `<key>.json` per entity.
// ABOUTME: Writes go through a flushed temp file and an atomic hard link.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{DeploymentReceipt, ReceiptStore, StoreError};
use crate::types::EntityKey;

const EXTENSION: &str = "json";

/// Receipts stored as individual JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileReceiptStore {
    dir: PathBuf,
}

impl FileReceiptStore {
    /// Open (creating if needed) a receipt directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(dir.display(), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &EntityKey) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    fn temp_path_for(&self, key: &EntityKey) -> PathBuf {
        self.dir.join(format!(".{key}.{}.tmp", std::process::id()))
    }

    fn write_temp(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    #[cfg(unix)]
    fn sync_dir(&self) -> Result<(), StoreError> {
        File::open(&self.dir)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| StoreError::io(self.dir.display(), e))
    }

    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl ReceiptStore for FileReceiptStore {
    fn has(&self, key: &EntityKey) -> bool {
        self.path_for(key).is_file()
    }

    fn get(&self, key: &EntityKey) -> Result<DeploymentReceipt, StoreError> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(key.clone()));
            }
            Err(e) => return Err(StoreError::io(path.display(), e)),
        };

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            key: key.clone(),
            source,
        })
    }

    fn put(&self, key: &EntityKey, receipt: &DeploymentReceipt) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if path.exists() {
            return Err(StoreError::AlreadyExists(key.clone()));
        }

        let bytes = serde_json::to_vec(receipt).map_err(|source| StoreError::Corrupt {
            key: key.clone(),
            source,
        })?;

        let temp = self.temp_path_for(key);
        if let Err(e) = self.write_temp(&temp, &bytes) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::io(temp.display(), e));
        }

        // link(2) fails if the target exists, so a concurrent writer cannot be overwritten
        let linked = fs::hard_link(&temp, &path);
        let _ = fs::remove_file(&temp);
        match linked {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists(key.clone()));
            }
            Err(e) => return Err(StoreError::io(path.display(), e)),
        }

        self.sync_dir()?;
        tracing::debug!("Recorded receipt {} at {}", key, path.display());
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<(EntityKey, DeploymentReceipt)>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(self.dir.display(), e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(self.dir.display(), e))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(key) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|stem| stem.starts_with(prefix))
                .and_then(EntityKey::from_stored)
            else {
                continue;
            };
            keys.push(key);
        }

        keys.sort();
        keys.into_iter()
            .map(|key| -> Result<_, StoreError> {
                let receipt = self.get(&key)?;
                Ok((key, receipt))
            })
            .collect()
    }
}
