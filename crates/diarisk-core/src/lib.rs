//! Core domain types and capability traits for diarisk.
//!
//! This crate provides the types shared by the model backends and the server:
//!
//! - [`PatientRecord`]: The per-request input record
//! - [`FeatureVector`]: The fixed-order numeric model input
//! - [`CategoricalEncoder`] and [`Classifier`]: Capabilities a backend must expose
//! - [`InvalidInput`]: Error raised when encoding or inference rejects a record
//! - [`Recommendation`]: Threshold-selected advice for probability responses
//!
//! # Example
//!
//! ```rust
//! use diarisk_core::{CategoricalEncoder, InvalidInput, PatientRecord};
//!
//! struct Codes;
//!
//! impl CategoricalEncoder for Codes {
//!     fn encode(&self, category: &str) -> Result<i64, InvalidInput> {
//!         match category {
//!             "Female" => Ok(0),
//!             "Male" => Ok(1),
//!             "never" => Ok(4),
//!             other => Err(InvalidInput::UnseenCategory { value: other.to_string() }),
//!         }
//!     }
//! }
//!
//! let record = PatientRecord {
//!     gender: "Male".to_string(),
//!     age: 45.0,
//!     hypertension: 0,
//!     heart_disease: 0,
//!     smoking_history: "never".to_string(),
//!     bmi: 27.3,
//!     hba1c_level: 5.8,
//!     blood_glucose_level: 110,
//! };
//!
//! let features = record.to_features(&Codes).unwrap();
//! assert_eq!(features.as_slice(), &[1.0, 45.0, 0.0, 0.0, 4.0, 27.3, 5.8, 110.0]);
//! ```

mod recommendation;

pub use recommendation::{to_percentage, Recommendation, RiskLevel, RISK_THRESHOLD};

use std::fmt;

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while turning a record into a prediction.
///
/// Every variant is a client error: the record carried a value that the
/// fitted artifacts cannot handle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidInput {
    /// Categorical value missing from the encoder vocabulary.
    #[error("y contains previously unseen labels: '{value}'")]
    UnseenCategory { value: String },

    /// A feature was NaN or infinite when it reached the model.
    #[error("Input contains NaN or infinity in feature '{feature}'")]
    NonFiniteFeature { feature: &'static str },

    /// Any other rejection raised by the inference backend.
    #[error("{0}")]
    Model(String),
}

// ============================================================================
// Features
// ============================================================================

/// Number of features the model consumes.
pub const FEATURE_COUNT: usize = 8;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "smoking_history",
    "bmi",
    "HbA1c_level",
    "blood_glucose_level",
];

/// A flat numeric model input in [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Pairs each value with its feature name.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }

    /// Fails on the first NaN or infinite value.
    pub fn ensure_finite(&self) -> Result<(), InvalidInput> {
        match self.named().find(|(_, v)| !v.is_finite()) {
            Some((feature, _)) => Err(InvalidInput::NonFiniteFeature { feature }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Patient Record
// ============================================================================

/// Patient attributes submitted for a single prediction.
///
/// Numeric fields are type checked only. Flags such as `hypertension` are
/// expected to be 0 or 1 but are passed through as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub gender: String,
    pub age: f64,
    #[serde(deserialize_with = "whole_number")]
    pub hypertension: i64,
    #[serde(deserialize_with = "whole_number")]
    pub heart_disease: i64,
    pub smoking_history: String,
    pub bmi: f64,
    #[serde(rename = "HbA1c_level")]
    pub hba1c_level: f64,
    #[serde(deserialize_with = "whole_number")]
    pub blood_glucose_level: i64,
}

/// Accepts JSON integers and floats without a fractional part (`110.0`).
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct WholeNumber;

    impl<'de> Visitor<'de> for WholeNumber {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a whole number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            // Upper bound is exclusive: i64::MAX as f64 rounds up to 2^63.
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }
    }

    deserializer.deserialize_any(WholeNumber)
}

impl PatientRecord {
    /// Encodes the categorical fields and assembles the model input.
    pub fn to_features<E>(&self, encoder: &E) -> Result<FeatureVector, InvalidInput>
    where
        E: CategoricalEncoder + ?Sized,
    {
        let gender = encoder.encode(&self.gender)?;
        let smoking_history = encoder.encode(&self.smoking_history)?;

        Ok(FeatureVector::new([
            gender as f64,
            self.age,
            self.hypertension as f64,
            self.heart_disease as f64,
            smoking_history as f64,
            self.bmi,
            self.hba1c_level,
            self.blood_glucose_level as f64,
        ]))
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Rejects a probability pair with a NaN or a value outside [0, 1].
pub fn ensure_probability(probabilities: [f64; 2]) -> Result<[f64; 2], InvalidInput> {
    if probabilities.iter().all(|p| (0.0..=1.0).contains(p)) {
        Ok(probabilities)
    } else {
        Err(InvalidInput::Model(format!(
            "model returned invalid class probabilities {:?}",
            probabilities
        )))
    }
}

/// A fitted mapping from category strings to integer codes.
pub trait CategoricalEncoder: Send + Sync {
    fn encode(&self, category: &str) -> Result<i64, InvalidInput>;
}

/// A binary classifier over [`FeatureVector`]s.
pub trait Classifier: Send + Sync {
    /// Returns `[p_negative, p_positive]`.
    fn predict_probability(&self, features: &FeatureVector) -> Result<[f64; 2], InvalidInput>;

    /// Returns the most probable class label. Ties resolve to 0.
    fn predict(&self, features: &FeatureVector) -> Result<u8, InvalidInput> {
        let [p0, p1] = ensure_probability(self.predict_probability(features)?)?;
        Ok(u8::from(p1 > p0))
    }
}
