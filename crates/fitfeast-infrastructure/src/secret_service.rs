//! Secret service implementation.
//!
//! This module provides a service for managing secret configuration (API keys)
//! stored in secret.json.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use version_migrate::{FileStorage, FileStorageStrategy, FormatStrategy, LoadBehavior};

use fitfeast_core::config::SecretConfig;
use fitfeast_core::secret::SecretService;

use crate::paths::FitfeastPaths;

/// Service for managing secret configuration.
///
/// This implementation reads secret configuration using FileStorage
/// and caches it to avoid repeated file I/O operations.
#[derive(Clone)]
pub struct SecretServiceImpl {
    /// Cached secret config loaded from storage.
    /// Uses RwLock for thread-safe lazy loading.
    secrets: Arc<RwLock<Option<SecretConfig>>>,
    /// FileStorage instance for persistence.
    storage: Arc<RwLock<FileStorage>>,
}

impl SecretServiceImpl {
    /// Creates a SecretServiceImpl over the default secret.json location,
    /// writing the fill-me-in template on first run.
    pub fn new() -> Result<Self> {
        let path = FitfeastPaths::ensure_secret_file()?;
        Self::with_path(path)
    }

    /// Creates a SecretServiceImpl over a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Result<Self> {
        // Setup migrator (no versioning for secrets, just load/save)
        let migrator = version_migrate::Migrator::builder().build();

        // Setup storage strategy: JSON format, CreateIfMissing
        let strategy = FileStorageStrategy::new()
            .with_format(FormatStrategy::Json)
            .with_load_behavior(LoadBehavior::CreateIfMissing);

        let storage = FileStorage::new(path, migrator, strategy)
            .map_err(|e| anyhow::anyhow!("Failed to create FileStorage: {}", e))?;

        Ok(Self {
            secrets: Arc::new(RwLock::new(None)),
            storage: Arc::new(RwLock::new(storage)),
        })
    }

    /// Loads the secrets from storage if not already cached.
    fn load_secrets_internal(&self) -> Result<SecretConfig, String> {
        // Check if already cached
        {
            let read_lock = self.secrets.read().unwrap();
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        // Load from FileStorage
        let storage = self.storage.read().unwrap();
        let secrets: Vec<SecretConfig> = storage
            .query("secret")
            .map_err(|e| format!("Failed to query secret: {}", e))?;

        // secret is a single object, take first or return default
        let loaded = secrets.into_iter().next().unwrap_or_default();

        // Cache it
        {
            let mut write_lock = self.secrets.write().unwrap();
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        self.load_secrets_internal()
    }

    async fn secret_file_exists(&self) -> bool {
        self.load_secrets_internal().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_yields_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let service = SecretServiceImpl::with_path(temp_dir.path().join("secret.json")).unwrap();

        let config = service.load_secrets().await.unwrap();
        assert!(config.gemini.is_none());
    }

    #[tokio::test]
    async fn test_loads_gemini_key_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(
            &path,
            r#"{"gemini": {"api_key": "test-key", "model_name": "gemini-2.5-flash"}}"#,
        )
        .unwrap();

        let service = SecretServiceImpl::with_path(path).unwrap();
        let config = service.load_secrets().await.unwrap();
        let gemini = config.gemini.expect("gemini config should be present");
        assert_eq!(gemini.api_key, "test-key");
        assert_eq!(gemini.model_name.as_deref(), Some("gemini-2.5-flash"));
    }
}
