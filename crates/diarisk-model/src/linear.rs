//! Logistic regression backend.

use diarisk_core::{FeatureVector, InvalidInput, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

use crate::{sigmoid, ArtifactError};

/// Binary logistic regression: `p1 = sigmoid(w·x + b)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(ArtifactError::Invalid(format!(
                "logistic model has {} coefficients, expected {}",
                self.coefficients.len(),
                FEATURE_COUNT
            )));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::Invalid("logistic model has non-finite weights".into()));
        }
        Ok(())
    }

    pub fn predict_probability(&self, features: &FeatureVector) -> Result<[f64; 2], InvalidInput> {
        features.ensure_finite()?;

        if self.coefficients.len() != FEATURE_COUNT {
            return Err(InvalidInput::Model(format!(
                "X has {} features, but LogisticModel is expecting {} features as input",
                FEATURE_COUNT,
                self.coefficients.len()
            )));
        }

        let z = self
            .coefficients
            .iter()
            .zip(features.as_slice())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;

        // Finite inputs can still overflow to inf - inf.
        if z.is_nan() {
            return Err(InvalidInput::Model(
                "decision function overflowed to NaN for the given input".into(),
            ));
        }

        let p1 = sigmoid(z);
        Ok([1.0 - p1, p1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hba1c_model() -> LogisticModel {
        // Only HbA1c (index 6) contributes; crosses 0.5 at HbA1c = 6.5.
        LogisticModel {
            coefficients: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0],
            intercept: -13.0,
        }
    }

    fn features(hba1c: f64) -> FeatureVector {
        FeatureVector::new([1.0, 45.0, 0.0, 0.0, 4.0, 27.3, hba1c, 110.0])
    }

    #[test]
    fn test_probability_sums_to_one() {
        let [p0, p1] = hba1c_model().predict_probability(&features(5.8)).unwrap();
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
        assert!(p1 < 0.5);
    }

    #[test]
    fn test_midpoint() {
        let [_, p1] = hba1c_model().predict_probability(&features(6.5)).unwrap();
        assert!((p1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_finite_input() {
        let err = hba1c_model().predict_probability(&features(f64::INFINITY)).unwrap_err();
        assert_eq!(err, InvalidInput::NonFiniteFeature { feature: "HbA1c_level" });
    }

    #[test]
    fn test_overflowing_decision_function_is_rejected() {
        let model = LogisticModel {
            coefficients: vec![0.0, 0.0, 0.0, 0.0, 0.0, -2.0, 2.0, 0.0],
            intercept: 0.0,
        };
        model.validate().unwrap();

        let x = FeatureVector::new([1.0, 45.0, 0.0, 0.0, 4.0, 1e308, 1e308, 110.0]);
        let err = model.predict_probability(&x).unwrap_err();
        assert!(matches!(err, InvalidInput::Model(_)));
    }

    #[test]
    fn test_saturates_instead_of_failing() {
        let model = LogisticModel {
            coefficients: vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0],
            intercept: 0.0,
        };
        let [p0, p1] = model.predict_probability(&features(1e308)).unwrap();
        assert_eq!((p0, p1), (0.0, 1.0));
    }

    #[test]
    fn test_validate_rejects_nan_weight() {
        let mut model = hba1c_model();
        model.intercept = f64::NAN;
        assert!(model.validate().is_err());
    }
}
