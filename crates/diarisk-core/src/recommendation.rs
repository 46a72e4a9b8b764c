//! Risk recommendations for probability responses.

use serde::Serialize;

/// Percentages at or above this value are severe.
pub const RISK_THRESHOLD: f64 = 50.0;

/// Converts a positive-class probability to a percentage rounded to 2 places.
///
/// Exact halves round away from zero (`f64::round`). A percentage whose binary
/// value sits within an ulp of a half may differ in the last digit from
/// round-half-even on the exact binary value; that difference is accepted.
pub fn to_percentage(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

/// Risk band selected by [`RISK_THRESHOLD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Mild,
    Severe,
}

impl RiskLevel {
    /// Non-finite percentages fall through to `Severe`.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage < RISK_THRESHOLD {
            RiskLevel::Mild
        } else {
            RiskLevel::Severe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Mild => "Mild Risk 0-50%",
            RiskLevel::Severe => "Severe Risk 50-100%",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskLevel::Mild => {
                "Your symptoms show a low risk of Diabetes. Stay aware and maintain healthy habits."
            }
            RiskLevel::Severe => {
                "Your symptoms suggest a moderate to high risk of Diabetes. Seek medical help ASAP."
            }
        }
    }

    pub fn actions(&self) -> [&'static str; 4] {
        match self {
            RiskLevel::Mild => [
                "Keep an eye on your health.",
                "Follow a balanced diet.",
                "Get routine check-up.",
                "Stay active & Exercise regularly.",
            ],
            RiskLevel::Severe => [
                "Contact a healthcare professional immediately.",
                "Visit a Clinic or Hospital if Symptoms Worsen.",
                "Follow Medical Treatment & Recommendations.",
                "Get tested to confirm diagnosis.",
            ],
        }
    }
}

/// Static advice block returned alongside a prediction percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub risk_level: &'static str,
    pub message: &'static str,
    pub actions: [&'static str; 4],
}

impl Recommendation {
    pub fn for_percentage(percentage: f64) -> Self {
        RiskLevel::from_percentage(percentage).into()
    }
}

impl From<RiskLevel> for Recommendation {
    fn from(level: RiskLevel) -> Self {
        Self {
            risk_level: level.label(),
            message: level.message(),
            actions: level.actions(),
        }
    }
}
