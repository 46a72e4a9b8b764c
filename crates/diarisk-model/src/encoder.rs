//! Label encoder backend.

use std::collections::HashMap;

use diarisk_core::{CategoricalEncoder, InvalidInput};
use serde::Deserialize;

use crate::ArtifactError;

/// On-disk shape of a fitted encoder.
#[derive(Debug, Deserialize)]
struct EncoderArtifact {
    classes: Vec<String>,
}

/// Maps each known category to its position in the fitted vocabulary.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Builds an encoder from an already fitted vocabulary, keeping its order.
    pub fn new(classes: Vec<String>) -> Result<Self, ArtifactError> {
        if classes.is_empty() {
            return Err(ArtifactError::Invalid("encoder has no classes".into()));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (idx, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), idx as i64).is_some() {
                return Err(ArtifactError::Invalid(format!("duplicate encoder class '{}'", class)));
            }
        }

        Ok(Self { classes, codes })
    }

    /// Fits a vocabulary from raw values: sorted, deduplicated.
    pub fn fit<I, S>(values: I) -> Result<Self, ArtifactError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: Vec<String> = values.into_iter().map(Into::into).collect();
        classes.sort();
        classes.dedup();
        Self::new(classes)
    }

    pub fn from_json(content: &str) -> Result<Self, ArtifactError> {
        let artifact: EncoderArtifact = serde_json::from_str(content)?;
        Self::new(artifact.classes)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the category for a code.
    pub fn inverse(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }
}

impl CategoricalEncoder for LabelEncoder {
    fn encode(&self, category: &str) -> Result<i64, InvalidInput> {
        self.codes
            .get(category)
            .copied()
            .ok_or_else(|| InvalidInput::UnseenCategory { value: category.to_string() })
    }
}
