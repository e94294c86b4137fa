//! DailyLog domain model and log store trait.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use version_migrate::DeriveQueryable as Queryable;

use crate::error::Result;
use crate::food::FoodItem;
use crate::nutrition::{PortionNutrients, scale_portion};

/// A persisted, weight-scaled meal entry.
///
/// Created exactly once at save time from a [`FoodItem`] and the weight the
/// user settled on; immutable thereafter; removed only by explicit deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[queryable(entity = "daily_log")]
pub struct DailyLog {
    /// Unique identifier within the log collection.
    pub id: String,
    /// When the entry was saved.
    pub logged_at: DateTime<Utc>,
    /// Name of the logged food.
    pub food_name: String,
    /// Absolute nutrient totals for the logged portion.
    pub nutrients: PortionNutrients,
    /// Logged portion weight in grams.
    pub weight_grams: f64,
    /// The captured photo, base64-encoded JPEG, embedded in the record.
    pub image_base64: String,
}

impl DailyLog {
    /// Builds a log entry from an accepted analysis result and a chosen weight.
    ///
    /// The nutrient totals are always re-derived from the item's per-100 g
    /// profile at this point, so the stored totals match the chosen weight by
    /// construction.
    pub fn record(
        id: String,
        logged_at: DateTime<Utc>,
        item: &FoodItem,
        weight_grams: f64,
        image_base64: String,
    ) -> Self {
        Self {
            id,
            logged_at,
            food_name: item.name.clone(),
            nutrients: scale_portion(&item.per_100g, weight_grams),
            weight_grams,
            image_base64,
        }
    }
}

/// Store for the daily log collection.
///
/// The collection is insertion-ordered newest first: `append` prepends, and
/// `load_all` returns entries in display order. Every mutation is persisted
/// as a full snapshot before the call returns.
#[async_trait::async_trait]
pub trait LogRepository: Send + Sync {
    /// Prepends an entry and persists the updated collection.
    async fn append(&self, log: DailyLog) -> Result<()>;

    /// Removes the entry with the given id and persists the updated
    /// collection. Removing an absent id is a no-op, not an error.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Returns the full collection, newest first.
    async fn load_all(&self) -> Vec<DailyLog>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::NutrientProfile;

    #[test]
    fn test_record_scales_nutrients_to_chosen_weight() {
        let item = FoodItem {
            id: "food-1".to_string(),
            name: "apple".to_string(),
            per_100g: NutrientProfile {
                calories: 52.0,
                protein: 0.3,
                carbs: 14.0,
                fat: 0.2,
            },
            estimated_weight_grams: 150.0,
        };

        let log = DailyLog::record(
            "log-1".to_string(),
            Utc::now(),
            &item,
            200.0,
            "aGVsbG8=".to_string(),
        );

        assert_eq!(log.food_name, "apple");
        assert_eq!(log.weight_grams, 200.0);
        assert_eq!(log.nutrients.calories, 104);
        assert_eq!(log.nutrients.protein, 0.6);
        assert_eq!(log.nutrients.carbs, 28.0);
        assert_eq!(log.nutrients.fat, 0.4);
    }
}
