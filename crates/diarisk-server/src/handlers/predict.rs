//! Prediction HTTP handler.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use diarisk_core::PatientRecord;
use tracing::{info, warn};

use crate::dto::PredictResponse;
use crate::error::AppError;
use crate::services::predict as predict_service;
use crate::ServerState;

/// POST /predict - Score a patient record.
pub async fn predict(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<PatientRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(record) = payload.map_err(|e| {
        warn!("Rejected request body: {}", e.body_text());
        e
    })?;

    let response = predict_service::predict(&state, &record).map_err(|e| {
        warn!("Prediction failed: {}", e);
        e
    })?;

    info!(mode = %state.response_mode, "Prediction served");
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use diarisk_config::ResponseMode;
    use diarisk_core::{Classifier, FeatureVector, InvalidInput};
    use diarisk_model::{LabelEncoder, LogisticModel, ModelArtifact};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const MALE_NEVER: &str = r#"{
        "gender": "Male", "age": 45, "hypertension": 0, "heart_disease": 0,
        "smoking_history": "never", "bmi": 27.3, "HbA1c_level": 5.8,
        "blood_glucose_level": 110
    }"#;

    /// Always returns the same positive-class probability.
    struct FixedModel(f64);

    impl Classifier for FixedModel {
        fn predict_probability(&self, _: &FeatureVector) -> Result<[f64; 2], InvalidInput> {
            Ok([1.0 - self.0, self.0])
        }
    }

    /// Positive-class probability is HbA1c / 10, so the feature slot is observable.
    struct HbA1cModel;

    impl Classifier for HbA1cModel {
        fn predict_probability(&self, x: &FeatureVector) -> Result<[f64; 2], InvalidInput> {
            let p = x.get(6).unwrap_or_default() / 10.0;
            Ok([1.0 - p, p])
        }
    }

    fn app(model: impl Classifier + 'static, mode: ResponseMode) -> Router {
        let encoder = LabelEncoder::fit([
            "Female", "Male", "Other", "No Info", "current", "ever", "former", "never", "not current",
        ])
        .unwrap();
        crate::router(Arc::new(ServerState::new(model, encoder, mode)))
    }

    async fn post(app: Router, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn with_field(field: &str, value: Value) -> String {
        let mut body: Value = serde_json::from_str(MALE_NEVER).unwrap();
        body[field] = value;
        body.to_string()
    }

    #[tokio::test]
    async fn test_probability_example() {
        let (status, body) = post(app(FixedModel(0.32), ResponseMode::Probability), MALE_NEVER).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction_percentage"], json!(32.0));
        assert_eq!(body["recommendation"]["risk_level"], "Mild Risk 0-50%");
        assert_eq!(body["recommendation"]["actions"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_severe_block_at_threshold() {
        let (status, body) = post(app(FixedModel(0.5), ResponseMode::Probability), MALE_NEVER).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prediction_percentage"], json!(50.0));
        assert_eq!(body["recommendation"]["risk_level"], "Severe Risk 50-100%");
        assert_eq!(
            body["recommendation"]["message"],
            "Your symptoms suggest a moderate to high risk of Diabetes. Seek medical help ASAP."
        );
    }

    #[tokio::test]
    async fn test_percentage_rounded_to_two_places() {
        let (_, body) = post(app(FixedModel(0.123456), ResponseMode::Probability), MALE_NEVER).await;
        assert_eq!(body["prediction_percentage"], json!(12.35));
    }

    #[tokio::test]
    async fn test_risk_band_follows_reported_percentage() {
        let cases = [
            (0.4999, 49.99, "Mild Risk 0-50%"),
            (0.499996, 50.0, "Severe Risk 50-100%"),
            (0.5001, 50.01, "Severe Risk 50-100%"),
        ];
        for (probability, percentage, risk_level) in cases {
            let (status, body) = post(app(FixedModel(probability), ResponseMode::Probability), MALE_NEVER).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["prediction_percentage"], json!(percentage), "p = {}", probability);
            assert_eq!(body["recommendation"]["risk_level"], risk_level, "p = {}", probability);
        }
    }

    #[tokio::test]
    async fn test_overflowing_model_output_is_400() {
        let model = LogisticModel {
            coefficients: vec![0.0, 0.0, 0.0, 0.0, 0.0, -2.0, 2.0, 0.0],
            intercept: 0.0,
        };
        let body = with_field("bmi", json!(1e308));
        let mut record: Value = serde_json::from_str(&body).unwrap();
        record["HbA1c_level"] = json!(1e308);

        let (status, body) = post(app(ModelArtifact::LogisticRegression(model), ResponseMode::Probability), &record.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());
        assert!(body.get("prediction_percentage").is_none());
    }

    #[tokio::test]
    async fn test_nan_probability_is_400_in_both_modes() {
        for mode in [ResponseMode::Probability, ResponseMode::Classification] {
            let (status, body) = post(app(FixedModel(f64::NAN), mode), MALE_NEVER).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", mode);
            assert!(body["detail"].as_str().unwrap().contains("invalid class probabilities"));
        }
    }

    #[tokio::test]
    async fn test_whole_number_float_is_accepted() {
        let (status, _) = post(
            app(FixedModel(0.3), ResponseMode::Probability),
            &with_field("blood_glucose_level", json!(110.0)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_hba1c_reaches_model_slot() {
        let (_, body) = post(app(HbA1cModel, ResponseMode::Probability), MALE_NEVER).await;
        assert_eq!(body["prediction_percentage"], json!(58.0));
        assert_eq!(body["recommendation"]["risk_level"], "Severe Risk 50-100%");
    }

    #[tokio::test]
    async fn test_classification_mode() {
        let (status, body) = post(app(FixedModel(0.8), ResponseMode::Classification), MALE_NEVER).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "prediction": 1 }));

        let (_, body) = post(app(FixedModel(0.2), ResponseMode::Classification), MALE_NEVER).await;
        assert_eq!(body, json!({ "prediction": 0 }));
    }

    #[tokio::test]
    async fn test_unseen_category_is_400_in_both_modes() {
        for mode in [ResponseMode::Probability, ResponseMode::Classification] {
            let (status, body) = post(app(FixedModel(0.3), mode), &with_field("gender", json!("Robot"))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["detail"], "y contains previously unseen labels: 'Robot'");

            let (status, body) =
                post(app(FixedModel(0.3), mode), &with_field("smoking_history", json!("daily"))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["detail"].as_str().unwrap().contains("'daily'"));
        }
    }

    #[tokio::test]
    async fn test_model_rejection_is_400() {
        struct Refusing;
        impl Classifier for Refusing {
            fn predict_probability(&self, _: &FeatureVector) -> Result<[f64; 2], InvalidInput> {
                Err(InvalidInput::Model("feature vector rejected".into()))
            }
        }

        let (status, body) = post(app(Refusing, ResponseMode::Probability), MALE_NEVER).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": "feature vector rejected" }));
    }

    #[tokio::test]
    async fn test_schema_violation_is_422() {
        let (status, body) =
            post(app(FixedModel(0.3), ResponseMode::Probability), &with_field("age", json!("old"))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (status, _) = post(app(FixedModel(0.3), ResponseMode::Probability), r#"{"gender": "Male"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_json_is_422() {
        let (status, body) = post(app(FixedModel(0.3), ResponseMode::Probability), "{not json").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_415() {
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .body(Body::from(MALE_NEVER))
            .unwrap();
        let res = app(FixedModel(0.3), ResponseMode::Probability).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_out_of_range_flag_passes_through() {
        let (status, _) =
            post(app(FixedModel(0.3), ResponseMode::Probability), &with_field("hypertension", json!(7))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let app = app(HbA1cModel, ResponseMode::Probability);
        let (_, first) = post(app.clone(), MALE_NEVER).await;
        let (_, second) = post(app, MALE_NEVER).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let res = app(FixedModel(0.3), ResponseMode::Probability).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"OK");
    }
}
