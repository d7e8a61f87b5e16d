//! Readmission risk tiers

use serde::{Deserialize, Serialize};

/// Probabilities below this are low risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.30;
/// Probabilities at or above this are high risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.60;

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Display color paired with each risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Green,
    Orange,
    Red,
}

impl RiskLevel {
    /// Determine risk level from a readmission probability
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if probability >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn color(self) -> RiskColor {
        match self {
            RiskLevel::Low => RiskColor::Green,
            RiskLevel::Medium => RiskColor::Orange,
            RiskLevel::High => RiskColor::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Operator-facing summary with follow-up guidance
    pub fn message(self, probability: f64) -> String {
        let pct = probability * 100.0;
        match self {
            RiskLevel::Low => format!(
                "This patient has a LOW risk ({:.1}%) of being readmitted within 30 days. \
                 Continue standard post-discharge care protocols.",
                pct
            ),
            RiskLevel::Medium => format!(
                "This patient has a MODERATE risk ({:.1}%) of being readmitted within 30 days. \
                 Consider enhanced follow-up care and medication adherence monitoring.",
                pct
            ),
            RiskLevel::High => format!(
                "This patient has a HIGH risk ({:.1}%) of being readmitted within 30 days. \
                 Recommend intensive case management, early follow-up appointments, and patient education.",
                pct
            ),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a probability to its risk tier and display color
pub fn classify(probability: f64) -> (RiskLevel, RiskColor) {
    let level = RiskLevel::from_probability(probability);
    (level, level.color())
}

/// Per-tier message for a prediction
pub fn risk_message(level: RiskLevel, probability: f64) -> String {
    level.message(probability)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(classify(0.29), (RiskLevel::Low, RiskColor::Green));
        assert_eq!(classify(0.30), (RiskLevel::Medium, RiskColor::Orange));
        assert_eq!(classify(0.59), (RiskLevel::Medium, RiskColor::Orange));
        assert_eq!(classify(0.60), (RiskLevel::High, RiskColor::Red));
    }

    #[test]
    fn test_extremes() {
        assert_eq!(classify(0.0).0, RiskLevel::Low);
        assert_eq!(classify(1.0).0, RiskLevel::High);
    }

    #[test]
    fn test_risk_message_formats_percentage() {
        let message = risk_message(RiskLevel::High, 0.7234);
        assert!(message.contains("HIGH risk (72.3%)"));

        let message = risk_message(RiskLevel::Medium, 0.45);
        assert!(message.contains("MODERATE risk (45.0%)"));
    }

    #[test]
    fn test_serialization_names() {
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"Medium\"");
        assert_eq!(serde_json::to_string(&RiskColor::Orange).unwrap(), "\"orange\"");
    }
}
