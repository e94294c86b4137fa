//! Data Transfer Objects (DTOs) for persistence.
//!
//! These DTOs represent the versioned schema for persisting data.
//! They are private to the infrastructure layer and handle the evolution
//! of the storage format over time.
//!
//! ## Schema Versioning (Semantic Versioning)
//!
//! We follow semantic versioning for schema changes:
//! - **MAJOR (X.0.0)**: Breaking changes (field removal, type changes)
//! - **MINOR (1.X.0)**: Backward-compatible additions (new optional fields)
//! - **PATCH (1.0.X)**: Backward-compatible fixes (not typically used for schema)
//!
//! ### DailyLog Version History
//! - **1.0.0**: Initial schema
//!
//! ### UserProfile Version History
//! - **1.0.0**: Initial schema

pub mod daily_log;
pub mod user_profile;

pub use daily_log::{DailyLogV1_0, create_daily_log_migrator};
pub use user_profile::{UserProfileV1_0, create_user_profile_migrator};
