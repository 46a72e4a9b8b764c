//! Artifact backends for diarisk.
//!
//! Artifacts are JSON documents produced by the training side:
//!
//! - [`LabelEncoder`]: `{"classes": [...]}`, code = position in `classes`
//! - [`ModelArtifact`]: a classifier tagged by `"kind"`, either
//!   [`LogisticModel`] or [`TreeEnsemble`]
//!
//! Both are validated on load so that inference only fails on bad input,
//! never on a malformed artifact.

mod encoder;
mod linear;
mod tree;

pub use encoder::LabelEncoder;
pub use linear::LogisticModel;
pub use tree::{Aggregation, Node, Tree, TreeEnsemble};

use std::fs;
use std::path::Path;

use diarisk_core::{Classifier, FeatureVector, InvalidInput};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors raised while loading an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid artifact: {0}")]
    Invalid(String),
}

/// A serialized classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelArtifact {
    /// Parses and validates a model document.
    pub fn from_json(content: &str) -> Result<Self, ArtifactError> {
        let model: ModelArtifact = serde_json::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::LogisticRegression(_) => "logistic_regression",
            ModelArtifact::TreeEnsemble(_) => "tree_ensemble",
        }
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ModelArtifact::LogisticRegression(m) => m.validate(),
            ModelArtifact::TreeEnsemble(m) => m.validate(),
        }
    }
}

impl Classifier for ModelArtifact {
    fn predict_probability(&self, features: &FeatureVector) -> Result<[f64; 2], InvalidInput> {
        match self {
            ModelArtifact::LogisticRegression(m) => m.predict_probability(features),
            ModelArtifact::TreeEnsemble(m) => m.predict_probability(features),
        }
    }
}

/// Loads the classifier artifact at `path`.
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelArtifact, ArtifactError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let model = ModelArtifact::from_json(&content)?;
    info!(path = %path.display(), kind = model.kind(), "Loaded model artifact");
    Ok(model)
}

/// Loads the label encoder artifact at `path`.
pub fn load_encoder(path: impl AsRef<Path>) -> Result<LabelEncoder, ArtifactError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let encoder = LabelEncoder::from_json(&content)?;
    info!(path = %path.display(), classes = encoder.len(), "Loaded encoder artifact");
    Ok(encoder)
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
