//! riskmap core: maps a described AI model onto the risk tiers of frontier
//! safety frameworks and a regulatory compute threshold.
//!
//! - **Catalog:** typed frameworks, tiers and reference tables loaded from the
//!   processed JSON files ([`store`]), with documented defaults for missing files
//! - **Matching:** most-severe tier per framework, the regulatory compute rule and
//!   cross-framework gap detection ([`matcher`])
//! - **Analytics:** tier counts and capability coverage across the catalog ([`coverage`])

pub mod assessment;
pub mod config;
pub mod coverage;
pub mod error;
pub mod matcher;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use assessment::{BELOW_THRESHOLD, RiskAssessment};
pub use config::{ConfigOverrides, RiskmapConfig, config_exists, load_config};
pub use error::{ConfigError, RiskmapError, ValidationError};
pub use matcher::{MatchReason, RegulatoryVerdict, ThresholdMatcher, TierMatch, identify_gaps};
pub use store::Catalog;
pub use types::{
    ComputeThreshold, ComputeThresholdTable, Framework, ModelSpecs, RegulatoryRequirements,
    RiskTier, parse_flops,
};
