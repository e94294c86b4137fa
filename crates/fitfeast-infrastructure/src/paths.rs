//! Unified path management for fitfeast configuration files.
//!
//! All fitfeast configuration, secrets, and log data are managed via AppPaths
//! from the version-migrate crate for consistency across all storage.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use std::path::PathBuf;
use version_migrate::AppPaths;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for fitfeast.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/fitfeast/          # Config directory (AppPaths default)
/// ├── secret.json              # API keys
/// ├── logs.json                # Persisted daily log collection
/// └── profile.json             # Persisted user profile
/// ```
pub struct FitfeastPaths;

impl FitfeastPaths {
    /// Returns a configured AppPaths instance for fitfeast.
    fn app_paths() -> AppPaths {
        AppPaths::new("fitfeast")
    }

    /// Returns the fitfeast configuration directory.
    ///
    /// Uses AppPaths to determine the correct config directory for the platform.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    /// Returns the path to the persisted daily log collection.
    pub fn logs_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs.json"))
    }

    /// Returns the path to the persisted user profile.
    pub fn profile_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("profile.json"))
    }

    /// Returns the path to the secrets file.
    ///
    /// # Security Note
    ///
    /// Ensure this file has appropriate permissions (e.g., 600) to prevent
    /// unauthorized access.
    pub fn secret_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("secret.json"))
    }

    /// Ensures the secret file exists, creating it with a template if it doesn't.
    ///
    /// The template contains an empty Gemini API key for the user to fill in.
    ///
    /// # Security Note
    ///
    /// This function sets file permissions to 600 (user read/write only) on
    /// Unix systems.
    pub fn ensure_secret_file() -> Result<PathBuf, std::io::Error> {
        let secret_path = Self::secret_file()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()))?;

        // If file already exists, return the path
        if secret_path.exists() {
            return Ok(secret_path);
        }

        // Ensure parent directory exists
        if let Some(parent) = secret_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create typed template using SecretConfig
        use fitfeast_core::config::{GeminiConfig, SecretConfig};

        let template_config = SecretConfig {
            gemini: Some(GeminiConfig {
                api_key: String::new(),
                model_name: Some("gemini-2.5-flash".to_string()),
            }),
        };

        // Serialize to pretty JSON
        let template_json = serde_json::to_string_pretty(&template_config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        // Write template to file
        std::fs::write(&secret_path, template_json)?;

        // Set file permissions to 600 (user read/write only) on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&secret_path, permissions)?;
        }

        Ok(secret_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir() {
        let config_dir = FitfeastPaths::config_dir().unwrap();
        // AppPaths returns platform-specific config directory with "fitfeast" appended
        assert!(config_dir.ends_with("fitfeast"));
    }

    #[test]
    fn test_logs_file() {
        let logs_file = FitfeastPaths::logs_file().unwrap();
        assert!(logs_file.ends_with("logs.json"));
        let config_dir = FitfeastPaths::config_dir().unwrap();
        assert!(logs_file.starts_with(&config_dir));
    }

    #[test]
    fn test_profile_file() {
        let profile_file = FitfeastPaths::profile_file().unwrap();
        assert!(profile_file.ends_with("profile.json"));
        let config_dir = FitfeastPaths::config_dir().unwrap();
        assert!(profile_file.starts_with(&config_dir));
    }

    #[test]
    fn test_secret_file() {
        let secret_file = FitfeastPaths::secret_file().unwrap();
        assert!(secret_file.ends_with("secret.json"));
        let config_dir = FitfeastPaths::config_dir().unwrap();
        assert!(secret_file.starts_with(&config_dir));
    }
}
