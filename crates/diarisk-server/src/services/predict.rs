//! Record-to-prediction service.

use diarisk_config::ResponseMode;
use diarisk_core::{ensure_probability, to_percentage, InvalidInput, PatientRecord, Recommendation};
use tracing::debug;

use crate::dto::PredictResponse;
use crate::ServerState;

/// Encodes the record, runs the model and shapes the response for the
/// configured mode.
pub fn predict(state: &ServerState, record: &PatientRecord) -> Result<PredictResponse, InvalidInput> {
    let features = record.to_features(state.encoder.as_ref())?;
    debug!(features = ?features.as_slice(), "Assembled feature vector");

    match state.response_mode {
        ResponseMode::Classification => {
            let prediction = state.model.predict(&features)?;
            Ok(PredictResponse::Classification { prediction })
        }
        ResponseMode::Probability => {
            let [_, positive] = ensure_probability(state.model.predict_probability(&features)?)?;
            let prediction_percentage = to_percentage(positive);
            Ok(PredictResponse::Probability {
                prediction_percentage,
                recommendation: Recommendation::for_percentage(prediction_percentage),
            })
        }
    }
}
