use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::UrgencyLevel;

const EMERGENCY_KEYWORDS: &[&str] = &[
    "carbon monoxide",
    "gas leak",
    "structural collapse",
    "immediate danger",
    "severe poisoning",
    "unconscious",
    "hospital",
    "emergency room",
    "acute exposure",
    "life-threatening",
];

/// (issue type, threshold, message)
const THRESHOLDS: &[(&str, f64, &str)] = &[
    ("carbon-monoxide", 70.0, "CO levels above 70 ppm are immediately dangerous"),
    ("radon", 10.0, "Radon levels above 10 pCi/L require immediate action"),
    ("lead-asbestos", 5.0, "Lead levels in blood above 5 μg/dL in children require immediate intervention"),
];

static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UrgencyAlert {
    Emergency { message: String },
    High { message: String },
}

impl UrgencyAlert {
    pub fn recommended_level(&self) -> UrgencyLevel {
        match self {
            Self::Emergency { .. } => UrgencyLevel::Emergency,
            Self::High { .. } => UrgencyLevel::High,
        }
    }
}

/// Flags emergencies by keyword and high urgency by per-issue thresholds on
/// the first number in `measurements`.
pub fn assess_urgency(issue_type: &str, measurements: &str, health_impact: &str) -> Option<UrgencyAlert> {
    let combined = format!("{} {} {}", issue_type, measurements, health_impact).to_lowercase();
    if EMERGENCY_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return Some(UrgencyAlert::Emergency {
            message: "This appears to be an emergency situation. Consider calling 911 or local emergency services immediately."
                .to_string(),
        });
    }

    let (_, threshold, message) = THRESHOLDS.iter().find(|(issue, _, _)| *issue == issue_type)?;
    let value: f64 = FIRST_NUMBER.find(measurements)?.as_str().parse().ok()?;
    (value > *threshold).then(|| UrgencyAlert::High { message: message.to_string() })
}
