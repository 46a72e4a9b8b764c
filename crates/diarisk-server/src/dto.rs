use diarisk_core::Recommendation;
use serde::Serialize;

// === HTTP DTOs ===

/// Body of a successful `/predict` response. The variant follows the
/// configured response mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Classification {
        prediction: u8,
    },
    Probability {
        prediction_percentage: f64,
        recommendation: Recommendation,
    },
}
