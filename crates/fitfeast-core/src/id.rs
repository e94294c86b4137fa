//! Identifier generation capability.
//!
//! Stores and the analysis gateway receive an [`IdGenerator`] instead of
//! reaching for ambient randomness, which keeps them deterministic under
//! test.

use uuid::Uuid;

/// Source of fresh identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a new identifier, unique for the lifetime of the process.
    fn generate(&self) -> String;
}

/// Production id generator backed by UUID v4.
#[derive(Debug, Clone, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_non_empty() {
        let generator = UuidIdGenerator;
        let first = generator.generate();
        let second = generator.generate();
        assert!(!first.is_empty());
        assert_ne!(first, second);
    }
}
