use std::fmt;

use serde::Serialize;

/// Risk label as sent by the prediction service. The service's vocabulary is
/// open-ended, so unknown labels are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    Other(String),
}

impl RiskLevel {
    /// Exact, case-sensitive match.
    pub fn parse(label: &str) -> Self {
        match label {
            "Critical" => RiskLevel::Critical,
            "High" => RiskLevel::High,
            "Medium" => RiskLevel::Medium,
            "Low" => RiskLevel::Low,
            other => RiskLevel::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Critical => "Critical",
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Other(label) => label,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RiskLevel::Critical | RiskLevel::High => Severity::High,
            RiskLevel::Medium => Severity::Medium,
            RiskLevel::Low | RiskLevel::Other(_) => Severity::Low,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-tier visual treatment shared by the KPI cards and the ranking badges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn of_label(label: &str) -> Self {
        RiskLevel::parse(label).severity()
    }

    /// Class added to a KPI card.
    pub fn css_class(self) -> &'static str {
        match self {
            Severity::High => "risk-high",
            Severity::Medium => "risk-medium",
            Severity::Low => "risk-low",
        }
    }

    /// Text color of a ranking badge.
    pub fn badge_color(self) -> &'static str {
        match self {
            Severity::High => "red",
            Severity::Medium => "orange",
            Severity::Low => "green",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_and_high_share_high_severity() {
        assert_eq!(Severity::of_label("Critical"), Severity::High);
        assert_eq!(Severity::of_label("High"), Severity::High);
        assert_eq!(Severity::of_label("Medium"), Severity::Medium);
        assert_eq!(Severity::of_label("Low"), Severity::Low);
    }

    #[test]
    fn unknown_and_miscased_labels_fall_to_low() {
        assert_eq!(Severity::of_label("high"), Severity::Low);
        assert_eq!(Severity::of_label("Severe"), Severity::Low);
        assert_eq!(Severity::of_label(""), Severity::Low);
        assert_eq!(
            RiskLevel::parse("Severe"),
            RiskLevel::Other("Severe".to_string())
        );
        assert_eq!(RiskLevel::parse("Severe").to_string(), "Severe");
    }

    #[test]
    fn classes_and_colors() {
        assert_eq!(Severity::High.css_class(), "risk-high");
        assert_eq!(Severity::Medium.badge_color(), "orange");
        assert_eq!(Severity::Low.badge_color(), "green");
    }
}
