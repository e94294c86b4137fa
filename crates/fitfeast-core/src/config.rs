//! Secret configuration shapes.

use serde::{Deserialize, Serialize};
use version_migrate::DeriveQueryable as Queryable;

/// Gemini API configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GeminiConfig {
    /// API key for the Gemini REST API.
    pub api_key: String,
    /// Optional model override; the gateway falls back to its default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// Root secret configuration stored in secret.json.
#[derive(Deserialize, Serialize, Debug, Clone, Default, Queryable)]
#[queryable(entity = "secret")]
pub struct SecretConfig {
    /// Gemini credentials; `None` until the user fills in the template.
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}
