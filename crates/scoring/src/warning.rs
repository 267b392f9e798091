//! Warning level ladder

use serde::{Deserialize, Serialize};

/// Discretized risk category, ordered by implied risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Low,
    Moderate,
    Severe,
}

impl WarningLevel {
    /// Classify an integrity score. Thresholds are evaluated top-down and
    /// are non-overlapping: the first match wins.
    pub fn from_score(integrity_score: f64) -> Self {
        if integrity_score >= 0.6 {
            WarningLevel::None
        } else if integrity_score >= 0.4 {
            WarningLevel::Low
        } else if integrity_score >= 0.2 {
            WarningLevel::Moderate
        } else {
            WarningLevel::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarningLevel::None => "none",
            WarningLevel::Low => "low",
            WarningLevel::Moderate => "moderate",
            WarningLevel::Severe => "severe",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_boundaries() {
        assert_eq!(WarningLevel::from_score(0.6), WarningLevel::None);
        assert_eq!(WarningLevel::from_score(0.599), WarningLevel::Low);
        assert_eq!(WarningLevel::from_score(0.4), WarningLevel::Low);
        assert_eq!(WarningLevel::from_score(0.399), WarningLevel::Moderate);
        assert_eq!(WarningLevel::from_score(0.2), WarningLevel::Moderate);
        assert_eq!(WarningLevel::from_score(0.1999), WarningLevel::Severe);
        assert_eq!(WarningLevel::from_score(0.0), WarningLevel::Severe);
        assert_eq!(WarningLevel::from_score(1.0), WarningLevel::None);
    }

    #[test]
    fn test_risk_ordering() {
        assert!(WarningLevel::None < WarningLevel::Low);
        assert!(WarningLevel::Low < WarningLevel::Moderate);
        assert!(WarningLevel::Moderate < WarningLevel::Severe);
    }

    #[test]
    fn test_lowercase_serialization() {
        assert_eq!(
            serde_json::to_string(&WarningLevel::Moderate).unwrap(),
            "\"moderate\""
        );
    }
}
