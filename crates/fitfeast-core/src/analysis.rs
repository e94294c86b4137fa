//! Analysis gateway trait and outcome types.
//!
//! The gateway is the single boundary to the external vision service. Every
//! failure kind (not-food verdicts, low confidence, malformed responses,
//! transport errors) is normalized here into a [`RejectionReason`], so the
//! flow controller chooses user messaging from a tagged value rather than
//! from which code path failed.

use crate::food::FoodItem;

/// Why an analysis produced no usable food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// The model judged the image's subject not to be food, or returned no
    /// usable name for it.
    NotFood,
    /// The model reported a confidence below the acceptance threshold.
    LowConfidence,
    /// The service answered, but the response body could not be decoded.
    Malformed,
    /// The request never produced a usable response (network/service error).
    Transport,
}

/// Result of analyzing one captured image.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The image was recognized as food with sufficient confidence.
    Accepted(FoodItem),
    /// No usable result; the reason says why.
    Rejected(RejectionReason),
}

impl AnalysisOutcome {
    /// Returns the accepted item, if any.
    pub fn accepted(self) -> Option<FoodItem> {
        match self {
            Self::Accepted(item) => Some(item),
            Self::Rejected(_) => None,
        }
    }
}

/// Boundary to the external vision service.
///
/// `analyze` never fails: one attempt is made, and anything short of an
/// accepted food item comes back as a rejection.
#[async_trait::async_trait]
pub trait FoodAnalyzer: Send + Sync {
    /// Analyzes a base64-encoded JPEG capture.
    async fn analyze(&self, image_base64: &str) -> AnalysisOutcome;
}
