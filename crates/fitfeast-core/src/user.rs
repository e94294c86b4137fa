//! UserProfile domain model and profile store trait.
//!
//! The profile is a singleton biometric/goal record: created with defaults on
//! first run, replaced wholesale on edit, never deleted.

use serde::{Deserialize, Serialize};
use version_migrate::DeriveQueryable as Queryable;

use crate::error::Result;

/// Calorie offset applied to the daily target for a weight-change goal.
const GOAL_CALORIE_OFFSET: f64 = 500.0;

/// Biological sex used by the energy formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Weight goal driving the daily calorie target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

/// User profile domain model.
///
/// Heights are centimeters, weights kilograms; `activity_level` is the
/// multiplier applied to basal metabolic rate (1.2 sedentary through ~1.9
/// very active).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable)]
#[queryable(entity = "user_profile")]
pub struct UserProfile {
    /// Height in centimeters.
    pub height_cm: f64,
    /// Current weight in kilograms.
    pub weight_kg: f64,
    /// Target weight in kilograms.
    pub target_weight_kg: f64,
    /// Biological sex for the energy formulas.
    pub gender: Gender,
    /// Age in years.
    pub age: u32,
    /// Activity multiplier applied to BMR.
    pub activity_level: f64,
    /// Current weight goal.
    pub goal: Goal,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            height_cm: 175.0,
            weight_kg: 70.0,
            target_weight_kg: 68.0,
            gender: Gender::Male,
            age: 25,
            activity_level: 1.375,
            goal: Goal::Maintain,
        }
    }
}

impl UserProfile {
    /// Basal metabolic rate in kcal/day (Mifflin-St Jeor).
    pub fn bmr(&self) -> f64 {
        let base = 10.0 * self.weight_kg + 6.25 * self.height_cm - 5.0 * f64::from(self.age);
        match self.gender {
            Gender::Male => base + 5.0,
            Gender::Female => base - 161.0,
        }
    }

    /// Daily calorie target in kcal: BMR scaled by activity, shifted by goal.
    pub fn daily_calorie_target(&self) -> u32 {
        let maintenance = self.bmr() * self.activity_level;
        let target = match self.goal {
            Goal::Lose => maintenance - GOAL_CALORIE_OFFSET,
            Goal::Maintain => maintenance,
            Goal::Gain => maintenance + GOAL_CALORIE_OFFSET,
        };
        target.round().max(0.0) as u32
    }
}

/// Store for the singleton user profile.
#[async_trait::async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Returns the stored profile, or the documented default when nothing
    /// usable is stored.
    async fn load(&self) -> UserProfile;

    /// Overwrites the stored profile with the given record.
    async fn save(&self, profile: &UserProfile) -> Result<()>;
}
