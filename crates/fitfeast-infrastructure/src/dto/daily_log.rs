//! DailyLog DTOs and migrations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use fitfeast_core::log::DailyLog;
use fitfeast_core::nutrition::PortionNutrients;

/// Current schema version for DailyLogV1_0.
pub const DAILY_LOG_V1_0_VERSION: &str = "1.0.0";

/// V1.0.0: Initial daily log schema.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct DailyLogV1_0 {
    /// Unique entry identifier.
    pub id: String,
    /// Timestamp when the entry was saved.
    pub logged_at: DateTime<Utc>,
    /// Name of the logged food.
    pub food_name: String,
    /// Total kilocalories for the logged portion.
    pub total_calories: u32,
    /// Total protein grams for the logged portion.
    pub protein: f64,
    /// Total carbohydrate grams for the logged portion.
    pub carbs: f64,
    /// Total fat grams for the logged portion.
    pub fat: f64,
    /// Logged portion weight in grams.
    pub weight_grams: f64,
    /// Captured photo, base64-encoded JPEG.
    pub image_base64: String,
}

// ============================================================================
// Domain model conversions
// ============================================================================

/// Convert DailyLogV1_0 DTO to domain model.
impl IntoDomain<DailyLog> for DailyLogV1_0 {
    fn into_domain(self) -> DailyLog {
        DailyLog {
            id: self.id,
            logged_at: self.logged_at,
            food_name: self.food_name,
            nutrients: PortionNutrients {
                calories: self.total_calories,
                protein: self.protein,
                carbs: self.carbs,
                fat: self.fat,
            },
            weight_grams: self.weight_grams,
            image_base64: self.image_base64,
        }
    }
}

/// Convert domain model to DailyLogV1_0 DTO for persistence.
impl FromDomain<DailyLog> for DailyLogV1_0 {
    fn from_domain(log: DailyLog) -> Self {
        DailyLogV1_0 {
            id: log.id,
            logged_at: log.logged_at,
            food_name: log.food_name,
            total_calories: log.nutrients.calories,
            protein: log.nutrients.protein,
            carbs: log.nutrients.carbs,
            fat: log.nutrients.fat,
            weight_grams: log.weight_grams,
            image_base64: log.image_base64,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for DailyLog entities.
///
/// # Migration Path
///
/// - V1.0.0 → DailyLog: Converts DTO to domain model
pub fn create_daily_log_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    // Register migration path: V1.0.0 -> DailyLog
    let daily_log_path = version_migrate::Migrator::define("daily_log")
        .from::<DailyLogV1_0>()
        .into_with_save::<DailyLog>();

    migrator
        .register(daily_log_path)
        .expect("Failed to register daily_log migration path");

    migrator
}

#[cfg(test)]
mod migrator_tests {
    use super::*;

    #[test]
    fn test_daily_log_migrator_creation() {
        let _migrator = create_daily_log_migrator();
        // Migrator should be created successfully
    }

    #[test]
    fn test_daily_log_migration_v1_0_to_domain() {
        let migrator = create_daily_log_migrator();

        let json_value = serde_json::json!({
            "version": "1.0.0",
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "logged_at": "2025-01-01T12:30:00Z",
            "food_name": "apple",
            "total_calories": 104,
            "protein": 0.6,
            "carbs": 28.0,
            "fat": 0.4,
            "weight_grams": 200.0,
            "image_base64": "aGVsbG8="
        });

        let result: Result<DailyLog, _> = migrator.load_flat_from("daily_log", json_value);

        assert!(result.is_ok(), "Migration failed: {:?}", result.err());
        let log = result.unwrap();
        assert_eq!(log.food_name, "apple");
        assert_eq!(log.nutrients.calories, 104);
        assert_eq!(log.nutrients.protein, 0.6);
        assert_eq!(log.weight_grams, 200.0);
    }
}
