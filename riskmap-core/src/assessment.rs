//! The assessment record handed to callers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tier name reported for a framework none of whose tiers matched.
pub const BELOW_THRESHOLD: &str = "Below threshold";

/// Outcome of assessing one model against the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub model_name: String,
    /// Framework display name -> matched tier name (or [`BELOW_THRESHOLD`]),
    /// in catalog order.
    pub framework_assessments: IndexMap<String, String>,
    /// True iff training compute is strictly below the regulatory threshold.
    pub eu_compliant: bool,
    /// Required actions; only populated when not compliant.
    #[serde(default)]
    pub eu_requirements: Vec<String>,
    #[serde(default)]
    pub gaps_identified: Vec<String>,
}

impl RiskAssessment {
    /// Frameworks that assigned a real tier.
    pub fn triggered(&self) -> impl Iterator<Item = (&str, &str)> {
        self.framework_assessments
            .iter()
            .filter(|(_, tier)| tier.as_str() != BELOW_THRESHOLD)
            .map(|(fw, tier)| (fw.as_str(), tier.as_str()))
    }

    /// Frameworks that fell through to [`BELOW_THRESHOLD`].
    pub fn not_triggered(&self) -> impl Iterator<Item = &str> {
        self.framework_assessments
            .iter()
            .filter(|(_, tier)| tier.as_str() == BELOW_THRESHOLD)
            .map(|(fw, _)| fw.as_str())
    }

    pub fn is_triggered_anywhere(&self) -> bool {
        self.triggered().next().is_some()
    }

    pub fn tier_for(&self, framework: &str) -> Option<&str> {
        self.framework_assessments.get(framework).map(String::as_str)
    }
}
