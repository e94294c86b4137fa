//! UserProfile DTOs and migrations

use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, Versioned};

use fitfeast_core::user::{Gender, Goal, UserProfile};

/// Current schema version for UserProfileV1_0.
pub const USER_PROFILE_V1_0_VERSION: &str = "1.0.0";

/// Gender DTO matching domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderDTO {
    Male,
    Female,
}

impl From<GenderDTO> for Gender {
    fn from(dto: GenderDTO) -> Self {
        match dto {
            GenderDTO::Male => Gender::Male,
            GenderDTO::Female => Gender::Female,
        }
    }
}

impl From<Gender> for GenderDTO {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => GenderDTO::Male,
            Gender::Female => GenderDTO::Female,
        }
    }
}

/// Goal DTO matching domain model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalDTO {
    Lose,
    Maintain,
    Gain,
}

impl From<GoalDTO> for Goal {
    fn from(dto: GoalDTO) -> Self {
        match dto {
            GoalDTO::Lose => Goal::Lose,
            GoalDTO::Maintain => Goal::Maintain,
            GoalDTO::Gain => Goal::Gain,
        }
    }
}

impl From<Goal> for GoalDTO {
    fn from(goal: Goal) -> Self {
        match goal {
            Goal::Lose => GoalDTO::Lose,
            Goal::Maintain => GoalDTO::Maintain,
            Goal::Gain => GoalDTO::Gain,
        }
    }
}

/// V1.0.0: Initial user profile schema.
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct UserProfileV1_0 {
    /// Height in centimeters.
    pub height_cm: f64,
    /// Current weight in kilograms.
    pub weight_kg: f64,
    /// Target weight in kilograms.
    pub target_weight_kg: f64,
    /// Biological sex for the energy formulas.
    pub gender: GenderDTO,
    /// Age in years.
    pub age: u32,
    /// Activity multiplier applied to BMR.
    pub activity_level: f64,
    /// Current weight goal.
    pub goal: GoalDTO,
}

// ============================================================================
// Domain model conversions
// ============================================================================

/// Convert UserProfileV1_0 DTO to domain model.
impl IntoDomain<UserProfile> for UserProfileV1_0 {
    fn into_domain(self) -> UserProfile {
        UserProfile {
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            target_weight_kg: self.target_weight_kg,
            gender: self.gender.into(),
            age: self.age,
            activity_level: self.activity_level,
            goal: self.goal.into(),
        }
    }
}

/// Convert domain model to UserProfileV1_0 DTO for persistence.
impl FromDomain<UserProfile> for UserProfileV1_0 {
    fn from_domain(profile: UserProfile) -> Self {
        UserProfileV1_0 {
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
            target_weight_kg: profile.target_weight_kg,
            gender: profile.gender.into(),
            age: profile.age,
            activity_level: profile.activity_level,
            goal: profile.goal.into(),
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates and configures a Migrator instance for UserProfile entities.
///
/// # Migration Path
///
/// - V1.0.0 → UserProfile: Converts DTO to domain model
pub fn create_user_profile_migrator() -> version_migrate::Migrator {
    let mut migrator = version_migrate::Migrator::builder().build();

    // Register migration path: V1.0.0 -> UserProfile
    let user_profile_path = version_migrate::Migrator::define("user_profile")
        .from::<UserProfileV1_0>()
        .into_with_save::<UserProfile>();

    migrator
        .register(user_profile_path)
        .expect("Failed to register user_profile migration path");

    migrator
}
