// ABOUTME: Run lock preventing two deployments against the same receipt directory.
// ABOUTME: Uses atomic file creation with lock info stored next to the receipts.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lock file name inside the receipt directory.
pub const LOCK_FILENAME: &str = ".banksmith.lock";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("deployment locked by {holder} (pid {pid}) since {started_at}; use --force to override")]
    Held {
        holder: String,
        pid: u32,
        started_at: DateTime<Utc>,
    },

    #[error("lock acquired by another process while breaking {0}")]
    Contended(PathBuf),

    #[error("lock file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Information about who holds a run lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn current() -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }
}

/// A held run lock. Removed by [`RunLock::release`], or on drop otherwise.
#[derive(Debug)]
pub struct RunLock {
    path: Option<PathBuf>,
}

impl RunLock {
    /// Acquire the lock for `dir`.
    ///
    /// Creation is atomic (a hard link onto the lock path), so two racing
    /// processes cannot both succeed. An existing lock is broken when it is
    /// stale (>1 hour), corrupt, or `force` is set.
    pub fn acquire(dir: &Path, force: bool) -> Result<Self, LockError> {
        let path = dir.join(LOCK_FILENAME);
        let info = LockInfo::current();

        if Self::try_create(&path, &info)? {
            return Ok(Self { path: Some(path) });
        }

        match Self::read(&path) {
            Some(existing) if !force && !existing.is_stale() => {
                return Err(LockError::Held {
                    holder: existing.holder,
                    pid: existing.pid,
                    started_at: existing.started_at,
                });
            }
            Some(existing) if force => tracing::warn!(
                "Breaking lock held by {} (pid {}) since {}",
                existing.holder,
                existing.pid,
                existing.started_at
            ),
            Some(existing) => tracing::warn!(
                "Auto-breaking stale lock held by {} (pid {}) since {}",
                existing.holder,
                existing.pid,
                existing.started_at
            ),
            None => tracing::warn!("Lock info unreadable, breaking lock"),
        }

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(LockError::Io { path, source }),
        }

        if Self::try_create(&path, &info)? {
            Ok(Self { path: Some(path) })
        } else {
            Err(LockError::Contended(path))
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Release the lock, reporting a failure to remove the file.
    pub fn release(mut self) -> Result<(), LockError> {
        match self.path.take() {
            Some(path) => std::fs::remove_file(&path).map_err(|source| LockError::Io { path, source }),
            None => Ok(()),
        }
    }

    /// Publish `info` at `path` only if nothing is there yet. The content is
    /// written first and linked into place, so readers never see a partial file.
    fn try_create(path: &Path, info: &LockInfo) -> Result<bool, LockError> {
        let io_err = |source: std::io::Error| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        let temp = path.with_extension(format!(
            "lock.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let json = serde_json::to_vec(info).map_err(|e| io_err(e.into()))?;
        let written = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp)
            .and_then(|mut file| file.write_all(&json));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&temp);
            return Err(io_err(e));
        }

        let linked = std::fs::hard_link(&temp, path);
        let _ = std::fs::remove_file(&temp);
        match linked {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(io_err(e)),
        }
    }

    fn read(path: &Path) -> Option<LockInfo> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Some(path) = self.path.take()
            && let Err(e) = std::fs::remove_file(&path)
        {
            tracing::warn!("Failed to remove lock {}: {}", path.display(), e);
        }
    }
}
