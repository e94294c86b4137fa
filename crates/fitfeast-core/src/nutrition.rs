//! Nutrient scaling for portion adjustment.
//!
//! Analysis results carry macro values per 100 g; the logged portion rarely
//! weighs exactly 100 g. [`scale_portion`] maps a per-100 g profile and a
//! portion weight to absolute values for that portion.

use serde::{Deserialize, Serialize};

/// Smallest portion weight the adjustment UI offers, in grams.
pub const MIN_PORTION_GRAMS: f64 = 10.0;
/// Largest portion weight the adjustment UI offers, in grams.
pub const MAX_PORTION_GRAMS: f64 = 1000.0;
/// Step between adjacent portion weights in the adjustment UI, in grams.
pub const PORTION_STEP_GRAMS: f64 = 5.0;

/// Macro-nutrient profile per 100 g of a food.
///
/// All values are non-negative; callers construct this only from validated
/// analysis results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientProfile {
    /// Kilocalories per 100 g.
    pub calories: f64,
    /// Protein grams per 100 g.
    pub protein: f64,
    /// Carbohydrate grams per 100 g.
    pub carbs: f64,
    /// Fat grams per 100 g.
    pub fat: f64,
}

/// Absolute nutrient totals for a concrete portion.
///
/// Calories are rounded to the nearest kilocalorie; macros to one decimal
/// place, matching what the result screen displays and what gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortionNutrients {
    /// Total kilocalories for the portion.
    pub calories: u32,
    /// Total protein grams for the portion.
    pub protein: f64,
    /// Total carbohydrate grams for the portion.
    pub carbs: f64,
    /// Total fat grams for the portion.
    pub fat: f64,
}

/// Scales a per-100 g profile to absolute totals for `weight_grams`.
///
/// Pure and total: no hidden state, no failure modes. Callers must re-derive
/// the totals on every weight change instead of caching a previous result
/// against a new weight.
///
/// Weights outside [`MIN_PORTION_GRAMS`, `MAX_PORTION_GRAMS`] are a caller
/// contract violation; the scaler itself does not validate.
pub fn scale_portion(per_100g: &NutrientProfile, weight_grams: f64) -> PortionNutrients {
    let ratio = weight_grams / 100.0;
    PortionNutrients {
        calories: (per_100g.calories * ratio).round() as u32,
        protein: round1(per_100g.protein * ratio),
        carbs: round1(per_100g.carbs * ratio),
        fat: round1(per_100g.fat * ratio),
    }
}

/// Rounds to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Clamps a weight into the interactive adjustment domain.
pub fn clamp_portion_weight(weight_grams: f64) -> f64 {
    weight_grams.clamp(MIN_PORTION_GRAMS, MAX_PORTION_GRAMS)
}
