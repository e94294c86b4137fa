//! FoodItem domain model.
//!
//! A `FoodItem` is the transient result of a successful image analysis. It
//! lives only between the analysis and the user's save/discard decision; at
//! save time it is converted into a [`crate::log::DailyLog`] and dropped.

use serde::{Deserialize, Serialize};

use crate::nutrition::NutrientProfile;

/// A recognized food with its per-100 g profile and estimated portion size.
///
/// Created only by the analysis gateway on an accepted, food-positive
/// response. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    /// Identifier assigned by the gateway's injected id generator.
    pub id: String,
    /// Display name of the recognized food.
    pub name: String,
    /// Macro-nutrient values per 100 g.
    pub per_100g: NutrientProfile,
    /// Portion weight estimated by the vision model, in grams.
    pub estimated_weight_grams: f64,
}
