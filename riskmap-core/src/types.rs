//! Catalog and request types: risk tiers, frameworks, model descriptions,
//! the regulatory requirements table and the compute-threshold reference.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Default regulatory compute threshold (EU AI Act systemic-risk presumption).
pub const DEFAULT_REGULATORY_THRESHOLD_FLOPS: f64 = 1e25;

/// One severity level within a framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTier {
    /// Tier identifier (e.g., "ASL-3", "CCL-2"). Unique within a framework only.
    pub tier_name: String,
    /// Severity rank; higher is more dangerous. Only compared within a framework.
    #[serde(default)]
    pub tier_level: i64,
    /// Capability profile that triggers this tier.
    #[serde(default)]
    pub capability_threshold: String,
    /// Training compute at or above which this tier applies on its own.
    #[serde(default)]
    pub compute_threshold_flops: Option<f64>,
    /// Evaluations the model must pass for this tier.
    #[serde(default)]
    pub evaluation_requirements: Vec<String>,
    /// Safeguards required at this tier.
    #[serde(default)]
    pub required_safeguards: Vec<String>,
}

impl RiskTier {
    pub fn new(tier_name: impl Into<String>, tier_level: i64) -> Self {
        Self {
            tier_name: tier_name.into(),
            tier_level,
            capability_threshold: String::new(),
            compute_threshold_flops: None,
            evaluation_requirements: Vec::new(),
            required_safeguards: Vec::new(),
        }
    }

    pub fn with_compute_threshold(mut self, flops: f64) -> Self {
        self.compute_threshold_flops = Some(flops);
        self
    }

    pub fn with_capability_threshold(mut self, text: impl Into<String>) -> Self {
        self.capability_threshold = text.into();
        self
    }

    /// The compute trigger, if this tier declares one.
    ///
    /// A threshold of exactly zero counts as undeclared.
    pub fn compute_trigger(&self) -> Option<f64> {
        self.compute_threshold_flops.filter(|flops| *flops != 0.0)
    }
}

/// A named risk-classification scheme made of ordered tiers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Framework {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub framework_name: Option<String>,
    #[serde(default)]
    pub risk_tiers: Vec<RiskTier>,
}

impl Framework {
    pub fn new(
        organization: impl Into<String>,
        framework_name: impl Into<String>,
        risk_tiers: Vec<RiskTier>,
    ) -> Self {
        Self {
            organization: Some(organization.into()),
            framework_name: Some(framework_name.into()),
            risk_tiers,
        }
    }

    /// Name used to key this framework in an assessment.
    pub fn display_name(&self) -> &str {
        non_empty(self.framework_name.as_deref())
            .or_else(|| non_empty(self.organization.as_deref()))
            .unwrap_or("Unknown")
    }

    /// Organization, falling back to the display name.
    pub fn organization_name(&self) -> &str {
        non_empty(self.organization.as_deref()).unwrap_or_else(|| self.display_name())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Description of the model being assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpecs {
    pub name: String,
    pub training_compute_flops: f64,
    #[serde(default)]
    pub parameters: Option<f64>,
    #[serde(default)]
    pub passed_evaluations: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl ModelSpecs {
    pub fn new(name: impl Into<String>, training_compute_flops: f64) -> Self {
        Self {
            name: name.into(),
            training_compute_flops,
            parameters: None,
            passed_evaluations: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parameters(mut self, parameters: f64) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Reject descriptions the comparisons cannot handle.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let compute = self.training_compute_flops;
        if !compute.is_finite() || compute < 0.0 {
            return Err(ValidationError::InvalidCompute { value: compute });
        }
        if let Some(params) = self.parameters {
            if !params.is_finite() || params < 0.0 {
                return Err(ValidationError::InvalidParameters { value: params });
            }
        }
        Ok(())
    }
}

/// Parse a FLOP count written in plain or scientific notation ("1e25", "3.8E24").
pub fn parse_flops(input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        Ok(value) => Err(ValidationError::InvalidCompute { value }),
        Err(_) => Err(ValidationError::UnparseableCompute {
            input: trimmed.to_string(),
        }),
    }
}

/// The regulatory compute rule and the actions it requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryRequirements {
    #[serde(default = "default_regulatory_threshold")]
    pub compute_threshold_flops: f64,
    #[serde(default)]
    pub required_evaluations: Vec<String>,
    #[serde(default)]
    pub documentation_requirements: Vec<String>,
}

fn default_regulatory_threshold() -> f64 {
    DEFAULT_REGULATORY_THRESHOLD_FLOPS
}

impl RegulatoryRequirements {
    /// Threshold with no listed actions, used when a source omits the section.
    pub fn unspecified() -> Self {
        Self {
            compute_threshold_flops: DEFAULT_REGULATORY_THRESHOLD_FLOPS,
            required_evaluations: Vec::new(),
            documentation_requirements: Vec::new(),
        }
    }
}

impl Default for RegulatoryRequirements {
    fn default() -> Self {
        Self {
            compute_threshold_flops: DEFAULT_REGULATORY_THRESHOLD_FLOPS,
            required_evaluations: vec!["Model evaluation".into(), "Adversarial testing".into()],
            documentation_requirements: vec!["Technical documentation".into()],
        }
    }
}

/// A named compute threshold from the reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeThreshold {
    pub threshold_flops: f64,
    #[serde(default)]
    pub scientific_notation: String,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_defined: Option<i32>,
}

/// Reference table of compute thresholds, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputeThresholdTable {
    pub thresholds: Vec<ComputeThreshold>,
}

impl ComputeThresholdTable {
    pub fn new(thresholds: Vec<ComputeThreshold>) -> Self {
        Self { thresholds }
    }

    /// Thresholds a model trained with `compute` FLOPs has reached.
    pub fn exceeded_by(&self, compute: f64) -> Vec<&ComputeThreshold> {
        self.thresholds
            .iter()
            .filter(|t| compute >= t.threshold_flops)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

impl Default for ComputeThresholdTable {
    fn default() -> Self {
        Self::new(vec![ComputeThreshold {
            threshold_flops: DEFAULT_REGULATORY_THRESHOLD_FLOPS,
            scientific_notation: "10^25".into(),
            triggers: vec!["EU AI Act systemic risk".into()],
            year_defined: None,
        }])
    }
}
