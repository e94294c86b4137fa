//! File-backed daily log repository.
//!
//! Stores the full log collection as one JSON blob and keeps an in-memory
//! copy so reads never touch the disk. Every mutation writes the complete
//! snapshot back (write-through, no batching).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use version_migrate::{FileStorage, FileStorageStrategy, FormatStrategy, LoadBehavior};

use fitfeast_core::error::{FitfeastError, Result};
use fitfeast_core::log::{DailyLog, LogRepository};

use crate::dto::create_daily_log_migrator;
use crate::paths::FitfeastPaths;

/// File-backed [`LogRepository`] with version migration support.
///
/// The collection is held newest-first in memory; `append` prepends and
/// persists, `remove` filters and persists. An absent or unreadable blob at
/// startup yields the empty collection instead of an error.
#[derive(Clone)]
pub struct JsonLogRepository {
    /// Cached log collection, newest first.
    logs: Arc<RwLock<Vec<DailyLog>>>,
    /// FileStorage instance for persistence.
    storage: Arc<Mutex<FileStorage>>,
}

impl JsonLogRepository {
    /// Creates a repository over the default platform path.
    pub fn new() -> Result<Self> {
        let path = FitfeastPaths::logs_file()
            .map_err(|e| FitfeastError::config(format!("Failed to resolve logs path: {}", e)))?;
        Self::with_path(path)
    }

    /// Creates a repository over a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FitfeastError::io(format!("Failed to create data directory: {}", e)))?;
        }

        let storage = open_storage(&path, create_daily_log_migrator)?;

        // Hydrate the cache; an unreadable collection degrades to empty.
        let logs: Vec<DailyLog> = match storage.query("daily_log") {
            Ok(logs) => logs,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load daily logs, starting empty");
                Vec::new()
            }
        };

        Ok(Self {
            logs: Arc::new(RwLock::new(logs)),
            storage: Arc::new(Mutex::new(storage)),
        })
    }

    /// Persists the given snapshot of the full collection.
    async fn persist(&self, snapshot: Vec<DailyLog>) -> Result<()> {
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || {
            let mut storage = storage.blocking_lock();
            storage
                .update_and_save("daily_log", snapshot)
                .map_err(|e| FitfeastError::data_access(format!("Failed to save daily logs: {}", e)))
        })
        .await
        .map_err(|e| FitfeastError::internal(format!("Failed to join task: {}", e)))??;

        Ok(())
    }
}

#[async_trait::async_trait]
impl LogRepository for JsonLogRepository {
    async fn append(&self, log: DailyLog) -> Result<()> {
        let snapshot = {
            let mut logs = self.logs.write().await;
            logs.insert(0, log);
            logs.clone()
        };
        self.persist(snapshot).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let snapshot = {
            let mut logs = self.logs.write().await;
            let before = logs.len();
            logs.retain(|log| log.id != id);
            if logs.len() == before {
                // Absent id: nothing changed, nothing to persist.
                return Ok(());
            }
            logs.clone()
        };
        self.persist(snapshot).await
    }

    async fn load_all(&self) -> Vec<DailyLog> {
        self.logs.read().await.clone()
    }
}

/// Opens the blob storage, resetting an unreadable file.
///
/// A corrupt blob is replaced rather than kept: the next write-through
/// snapshot would overwrite it anyway, and startup must always succeed.
pub(crate) fn open_storage(
    path: &Path,
    migrator_factory: fn() -> version_migrate::Migrator,
) -> Result<FileStorage> {
    let strategy = FileStorageStrategy::new()
        .with_format(FormatStrategy::Json)
        .with_load_behavior(LoadBehavior::CreateIfMissing);

    match FileStorage::new(path.to_path_buf(), migrator_factory(), strategy) {
        Ok(storage) => Ok(storage),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "unreadable storage file, resetting");
            std::fs::remove_file(path)
                .map_err(|e| FitfeastError::io(format!("Failed to reset storage file: {}", e)))?;
            let strategy = FileStorageStrategy::new()
                .with_format(FormatStrategy::Json)
                .with_load_behavior(LoadBehavior::CreateIfMissing);
            FileStorage::new(path.to_path_buf(), migrator_factory(), strategy)
                .map_err(|e| FitfeastError::data_access(format!("Failed to open storage: {}", e)))
        }
    }
}
