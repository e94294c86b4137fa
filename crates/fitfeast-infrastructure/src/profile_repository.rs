//! File-backed user profile repository.
//!
//! The profile is a singleton record: `load` returns the stored record or
//! the documented default, `save` overwrites it wholesale.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use fitfeast_core::error::{FitfeastError, Result};
use fitfeast_core::user::{ProfileRepository, UserProfile};
use version_migrate::FileStorage;

use crate::dto::create_user_profile_migrator;
use crate::log_repository::open_storage;
use crate::paths::FitfeastPaths;

/// File-backed [`ProfileRepository`] with version migration support.
#[derive(Clone)]
pub struct JsonProfileRepository {
    /// Cached profile loaded from storage.
    profile: Arc<RwLock<UserProfile>>,
    /// FileStorage instance for persistence.
    storage: Arc<Mutex<FileStorage>>,
}

impl JsonProfileRepository {
    /// Creates a repository over the default platform path.
    pub fn new() -> Result<Self> {
        let path = FitfeastPaths::profile_file()
            .map_err(|e| FitfeastError::config(format!("Failed to resolve profile path: {}", e)))?;
        Self::with_path(path)
    }

    /// Creates a repository over a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FitfeastError::io(format!("Failed to create data directory: {}", e)))?;
        }

        let storage = open_storage(&path, create_user_profile_migrator)?;

        // Hydrate the cache; anything unreadable degrades to the default.
        let profiles: Vec<UserProfile> = match storage.query("user_profile") {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load profile, using default");
                Vec::new()
            }
        };
        let profile = profiles.into_iter().next().unwrap_or_default();

        Ok(Self {
            profile: Arc::new(RwLock::new(profile)),
            storage: Arc::new(Mutex::new(storage)),
        })
    }
}

#[async_trait::async_trait]
impl ProfileRepository for JsonProfileRepository {
    async fn load(&self) -> UserProfile {
        self.profile.read().await.clone()
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        {
            let mut cached = self.profile.write().await;
            *cached = profile.clone();
        }

        let storage = self.storage.clone();
        let profile_for_save = profile.clone();
        tokio::task::spawn_blocking(move || {
            let mut storage = storage.blocking_lock();
            storage
                .update_and_save("user_profile", vec![profile_for_save])
                .map_err(|e| FitfeastError::data_access(format!("Failed to save profile: {}", e)))
        })
        .await
        .map_err(|e| FitfeastError::internal(format!("Failed to join task: {}", e)))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitfeast_core::user::{Gender, Goal};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fresh_store_yields_default_profile() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonProfileRepository::with_path(temp_dir.path().join("profile.json")).unwrap();
        assert_eq!(repo.load().await, UserProfile::default());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("profile.json");
        let repo = JsonProfileRepository::with_path(path.clone()).unwrap();

        let edited = UserProfile {
            height_cm: 168.0,
            weight_kg: 62.0,
            target_weight_kg: 60.0,
            gender: Gender::Female,
            age: 31,
            activity_level: 1.55,
            goal: Goal::Lose,
        };
        repo.save(&edited).await.unwrap();
        assert_eq!(repo.load().await, edited);

        // Reload from disk through a fresh repository
        let reopened = JsonProfileRepository::with_path(path).unwrap();
        assert_eq!(reopened.load().await, edited);
    }

    #[tokio::test]
    async fn test_corrupt_blob_degrades_to_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("profile.json");
        std::fs::write(&path, "][").unwrap();

        let repo = JsonProfileRepository::with_path(path).unwrap();
        assert_eq!(repo.load().await, UserProfile::default());
    }
}
