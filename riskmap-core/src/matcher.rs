//! Threshold matcher: assigns a model its most severe applicable tier in
//! every framework, applies the regulatory compute rule and reports where the
//! frameworks disagree.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

use crate::assessment::{BELOW_THRESHOLD, RiskAssessment};
use crate::config::MatchingConfig;
use crate::error::Result;
use crate::store::Catalog;
use crate::types::{Framework, ModelSpecs, RiskTier};

/// Why a tier was selected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum MatchReason {
    /// Training compute reached the tier's compute threshold.
    Compute { threshold_flops: f64 },
    /// A capability label matched the tier's threshold text, either directly
    /// (`keyword` is `None`) or through a shared risk keyword.
    Capability {
        capability: String,
        keyword: Option<String>,
    },
}

impl std::fmt::Display for MatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchReason::Compute { threshold_flops } => {
                write!(f, "training compute >= {:e} FLOPs", threshold_flops)
            }
            MatchReason::Capability {
                capability,
                keyword: None,
            } => write!(f, "capability '{}' named in threshold", capability),
            MatchReason::Capability {
                capability,
                keyword: Some(keyword),
            } => write!(f, "capability '{}' shares keyword '{}'", capability, keyword),
        }
    }
}

/// Result of matching one model against one framework.
#[derive(Debug, Clone, PartialEq)]
pub enum TierMatch<'a> {
    Matched {
        tier: &'a RiskTier,
        reason: MatchReason,
    },
    BelowThreshold,
}

impl TierMatch<'_> {
    pub fn tier_name(&self) -> &str {
        match self {
            TierMatch::Matched { tier, .. } => &tier.tier_name,
            TierMatch::BelowThreshold => BELOW_THRESHOLD,
        }
    }

    pub fn reason(&self) -> Option<&MatchReason> {
        match self {
            TierMatch::Matched { reason, .. } => Some(reason),
            TierMatch::BelowThreshold => None,
        }
    }
}

/// Regulatory compute verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct RegulatoryVerdict {
    pub compliant: bool,
    pub requirements: Vec<String>,
}

/// Matches models against an immutable catalog. Cheap to share across threads.
#[derive(Debug, Clone)]
pub struct ThresholdMatcher {
    catalog: Arc<Catalog>,
    risk_keywords: Vec<String>,
}

impl ThresholdMatcher {
    /// Blank or whitespace-only keywords are skipped with a warning.
    pub fn new(catalog: impl Into<Arc<Catalog>>, matching: &MatchingConfig) -> Self {
        let mut risk_keywords = Vec::with_capacity(matching.risk_keywords.len());
        for keyword in &matching.risk_keywords {
            let keyword = keyword.trim();
            if keyword.is_empty() {
                tracing::warn!("Ignoring blank risk keyword");
                continue;
            }
            risk_keywords.push(keyword.to_lowercase());
        }
        Self {
            catalog: catalog.into(),
            risk_keywords,
        }
    }

    /// Matcher using the built-in risk keywords.
    pub fn with_default_keywords(catalog: impl Into<Arc<Catalog>>) -> Self {
        Self::new(catalog, &MatchingConfig::default())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Assess `model` against every framework in the catalog.
    pub fn assess(&self, model: &ModelSpecs) -> Result<RiskAssessment> {
        model.validate()?;

        let framework_assessments: IndexMap<String, String> = self
            .match_catalog(model)
            .into_iter()
            .map(|(framework, matched)| {
                if let Some(reason) = matched.reason() {
                    tracing::debug!(
                        model = %model.name,
                        framework = %framework,
                        tier = matched.tier_name(),
                        "Tier matched: {}",
                        reason
                    );
                }
                let tier = matched.tier_name().to_string();
                (framework, tier)
            })
            .collect();

        let verdict = self.check_regulatory(model.training_compute_flops);
        let gaps_identified = identify_gaps(&framework_assessments);

        tracing::info!(
            model = %model.name,
            frameworks = framework_assessments.len(),
            eu_compliant = verdict.compliant,
            gaps = gaps_identified.len(),
            "Assessment complete"
        );

        Ok(RiskAssessment {
            model_name: model.name.clone(),
            framework_assessments,
            eu_compliant: verdict.compliant,
            eu_requirements: verdict.requirements,
            gaps_identified,
        })
    }

    /// Match `model` against every framework, keyed by display name.
    ///
    /// A later framework with the same display name replaces the earlier
    /// match in place, so the keys line up with
    /// [`RiskAssessment::framework_assessments`]. Does not validate `model`.
    pub fn match_catalog(&self, model: &ModelSpecs) -> IndexMap<String, TierMatch<'_>> {
        let mut matches = IndexMap::with_capacity(self.catalog.frameworks.len());
        for framework in &self.catalog.frameworks {
            matches.insert(
                framework.display_name().to_string(),
                self.match_framework(framework, model),
            );
        }
        matches
    }

    /// Most severe tier of `framework` that `model` triggers.
    ///
    /// Tiers are visited by descending `tier_level`; equal levels keep catalog
    /// order. Within a tier the compute trigger is checked before capabilities.
    pub fn match_framework<'a>(
        &self,
        framework: &'a Framework,
        model: &ModelSpecs,
    ) -> TierMatch<'a> {
        let mut tiers: Vec<&RiskTier> = framework.risk_tiers.iter().collect();
        tiers.sort_by(|a, b| b.tier_level.cmp(&a.tier_level));

        for tier in tiers {
            if let Some(threshold_flops) = tier.compute_trigger() {
                if model.training_compute_flops >= threshold_flops {
                    return TierMatch::Matched {
                        tier,
                        reason: MatchReason::Compute { threshold_flops },
                    };
                }
            }

            let threshold_text = tier.capability_threshold.to_lowercase();
            for capability in &model.capabilities {
                if let Some(reason) = self.capability_reason(capability, &threshold_text) {
                    return TierMatch::Matched { tier, reason };
                }
            }
        }

        TierMatch::BelowThreshold
    }

    fn capability_reason(&self, capability: &str, threshold_text: &str) -> Option<MatchReason> {
        let lowered = capability.to_lowercase();
        if threshold_text.contains(&lowered) {
            return Some(MatchReason::Capability {
                capability: capability.to_string(),
                keyword: None,
            });
        }
        self.risk_keywords
            .iter()
            .find(|kw| lowered.contains(kw.as_str()) && threshold_text.contains(kw.as_str()))
            .map(|kw| MatchReason::Capability {
                capability: capability.to_string(),
                keyword: Some(kw.clone()),
            })
    }

    /// Compute at or above the regulatory threshold is non-compliant.
    pub fn check_regulatory(&self, training_compute_flops: f64) -> RegulatoryVerdict {
        let regulatory = &self.catalog.regulatory;
        if training_compute_flops >= regulatory.compute_threshold_flops {
            RegulatoryVerdict {
                compliant: false,
                requirements: regulatory.required_evaluations.clone(),
            }
        } else {
            RegulatoryVerdict {
                compliant: true,
                requirements: Vec::new(),
            }
        }
    }
}

/// Human-readable disagreements between per-framework tier assignments.
pub fn identify_gaps(assessments: &IndexMap<String, String>) -> Vec<String> {
    let mut gaps = Vec::new();

    let mut distinct_tiers: Vec<&str> = Vec::new();
    for tier in assessments.values() {
        if tier != BELOW_THRESHOLD && !distinct_tiers.contains(&tier.as_str()) {
            distinct_tiers.push(tier);
        }
    }
    if distinct_tiers.len() > 1 {
        gaps.push(format!(
            "Frameworks disagree on risk level: {}",
            distinct_tiers.join(", ")
        ));
    }

    let triggered = assessments.values().filter(|t| *t != BELOW_THRESHOLD).count();
    let not_triggered = assessments.len() - triggered;
    if triggered > 0 && not_triggered > 0 {
        gaps.push(format!(
            "Triggered in {} frameworks but not in {} others",
            triggered, not_triggered
        ));
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegulatoryRequirements;

    fn tiered_framework() -> Framework {
        Framework::new(
            "Lab",
            "Scaling Policy",
            vec![
                RiskTier::new("Tier-1", 1).with_capability_threshold("cyber"),
                RiskTier::new("Tier-3", 3).with_compute_threshold(1e25),
            ],
        )
    }

    fn matcher_for(frameworks: Vec<Framework>) -> ThresholdMatcher {
        ThresholdMatcher::with_default_keywords(Catalog {
            frameworks,
            ..Default::default()
        })
    }

    fn map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compute_trigger_is_inclusive() {
        let fw = tiered_framework();
        let matcher = matcher_for(vec![]);
        let at = ModelSpecs::new("at", 1e25);
        let below = ModelSpecs::new("below", 9.99e24);
        assert_eq!(matcher.match_framework(&fw, &at).tier_name(), "Tier-3");
        assert_eq!(matcher.match_framework(&fw, &below).tier_name(), BELOW_THRESHOLD);
    }

    #[test]
    fn test_shared_keyword_match() {
        let fw = tiered_framework();
        let matcher = matcher_for(vec![]);
        let model = ModelSpecs::new("m", 1e20).with_capabilities(["Cyber offense"]);
        let matched = matcher.match_framework(&fw, &model);
        assert_eq!(matched.tier_name(), "Tier-1");
        assert_eq!(
            matched.reason(),
            Some(&MatchReason::Capability {
                capability: "Cyber offense".into(),
                keyword: Some("cyber".into()),
            })
        );
    }

    #[test]
    fn test_direct_substring_match_is_case_insensitive() {
        let fw = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("High", 2)
                .with_capability_threshold("Models capable of AUTONOMOUS REPLICATION in the wild")],
        );
        let matcher = matcher_for(vec![]);
        let model = ModelSpecs::new("m", 0.0).with_capabilities(["Autonomous replication"]);
        let matched = matcher.match_framework(&fw, &model);
        assert_eq!(matched.tier_name(), "High");
        assert!(matches!(
            matched.reason(),
            Some(MatchReason::Capability { keyword: None, .. })
        ));
    }

    #[test]
    fn test_higher_tier_wins_over_lower_capability_match() {
        let fw = Framework::new(
            "Lab",
            "Policy",
            vec![
                RiskTier::new("Low", 1).with_capability_threshold("cbrn uplift"),
                RiskTier::new("High", 4).with_compute_threshold(1e24),
            ],
        );
        let matcher = matcher_for(vec![]);
        let model = ModelSpecs::new("m", 2e24).with_capabilities(["CBRN acceleration"]);
        assert_eq!(matcher.match_framework(&fw, &model).tier_name(), "High");
    }

    #[test]
    fn test_equal_levels_keep_catalog_order() {
        let fw = Framework::new(
            "Lab",
            "Policy",
            vec![
                RiskTier::new("First", 2).with_capability_threshold("persuasion"),
                RiskTier::new("Second", 2).with_capability_threshold("persuasion"),
            ],
        );
        let matcher = matcher_for(vec![]);
        let model = ModelSpecs::new("m", 0.0).with_capabilities(["Advanced persuasion"]);
        assert_eq!(matcher.match_framework(&fw, &model).tier_name(), "First");
    }

    #[test]
    fn test_unrelated_capability_does_not_match() {
        let fw = tiered_framework();
        let matcher = matcher_for(vec![]);
        let model = ModelSpecs::new("m", 1e20).with_capabilities(["Jailbreak resistance"]);
        assert_eq!(matcher.match_framework(&fw, &model).tier_name(), BELOW_THRESHOLD);
    }

    #[test]
    fn test_custom_keywords() {
        let fw = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("Bio", 3).with_capability_threshold("Biological weapon uplift")],
        );
        let catalog = Catalog {
            frameworks: vec![],
            ..Default::default()
        };
        let matching = MatchingConfig {
            risk_keywords: vec!["BIO".into()],
        };
        let matcher = ThresholdMatcher::new(catalog, &matching);
        let model = ModelSpecs::new("m", 0.0).with_capabilities(["bioengineering"]);
        assert_eq!(matcher.match_framework(&fw, &model).tier_name(), "Bio");

        let default_matcher = matcher_for(vec![]);
        assert_eq!(
            default_matcher.match_framework(&fw, &model).tier_name(),
            BELOW_THRESHOLD
        );
    }

    #[test]
    fn test_regulatory_boundary() {
        let matcher = matcher_for(vec![]);
        let at = matcher.check_regulatory(1e25);
        assert!(!at.compliant);
        assert_eq!(at.requirements, RegulatoryRequirements::default().required_evaluations);

        let below = matcher.check_regulatory(9.9e24);
        assert!(below.compliant);
        assert!(below.requirements.is_empty());
    }

    #[test]
    fn test_invalid_model_rejected() {
        let matcher = matcher_for(vec![tiered_framework()]);
        let err = matcher.assess(&ModelSpecs::new("bad", -3.0)).unwrap_err();
        assert!(matches!(err, crate::error::RiskmapError::Validation(_)));
    }

    #[test]
    fn test_gaps_empty_when_all_agree() {
        assert!(identify_gaps(&map(&[("A", "ASL-3"), ("B", "ASL-3")])).is_empty());
        assert!(
            identify_gaps(&map(&[("A", BELOW_THRESHOLD), ("B", BELOW_THRESHOLD)])).is_empty()
        );
        assert!(identify_gaps(&IndexMap::new()).is_empty());
    }

    #[test]
    fn test_gaps_disagreement_and_partial() {
        let gaps = identify_gaps(&map(&[
            ("RSP", "ASL-3"),
            ("FSF", "CCL-2"),
            ("Preparedness", BELOW_THRESHOLD),
            ("Other", "ASL-3"),
        ]));
        assert_eq!(
            gaps,
            vec![
                "Frameworks disagree on risk level: ASL-3, CCL-2".to_string(),
                "Triggered in 3 frameworks but not in 1 others".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_display_names_collapse() {
        let a = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("A", 1).with_compute_threshold(1.0)],
        );
        let b = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("B", 1).with_compute_threshold(1.0)],
        );
        let matcher = matcher_for(vec![a, b]);
        let result = matcher.assess(&ModelSpecs::new("m", 10.0)).unwrap();
        assert_eq!(result.framework_assessments.len(), 1);
        assert_eq!(result.tier_for("Policy"), Some("B"));
    }

    #[test]
    fn test_match_catalog_keys_follow_assessment() {
        let a = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("A", 1).with_compute_threshold(1.0)],
        );
        let b = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("B", 1).with_compute_threshold(100.0)],
        );
        let other = Framework::new("Other", "Plan", vec![]);
        let matcher = matcher_for(vec![a, other, b]);
        let model = ModelSpecs::new("m", 10.0);

        let matches = matcher.match_catalog(&model);
        let assessment = matcher.assess(&model).unwrap();
        let keys: Vec<&String> = matches.keys().collect();
        let expected: Vec<&String> = assessment.framework_assessments.keys().collect();
        assert_eq!(keys, expected);
        assert_eq!(matches["Policy"].tier_name(), BELOW_THRESHOLD);
        assert_eq!(matches["Policy"].reason(), None);
        assert_eq!(assessment.tier_for("Policy"), Some(BELOW_THRESHOLD));
    }

    #[test]
    fn test_blank_keywords_are_ignored() {
        let fw = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("Top", 5).with_capability_threshold("nothing relevant")],
        );
        let matching = MatchingConfig {
            risk_keywords: vec![String::new(), "  ".into(), " Cyber ".into()],
        };
        assert!(matching.validate().is_err());

        let matcher = ThresholdMatcher::new(Catalog::default(), &matching);
        let unrelated = ModelSpecs::new("m", 0.0).with_capabilities(["Jailbreak resistance"]);
        assert_eq!(matcher.match_framework(&fw, &unrelated).tier_name(), BELOW_THRESHOLD);

        let cyber_tier = Framework::new(
            "Lab",
            "Policy",
            vec![RiskTier::new("Cyber", 2).with_capability_threshold("cyber offense uplift")],
        );
        let model = ModelSpecs::new("m", 0.0).with_capabilities(["Cyberattacks"]);
        let matched = matcher.match_framework(&cyber_tier, &model);
        assert_eq!(
            matched.reason(),
            Some(&MatchReason::Capability {
                capability: "Cyberattacks".into(),
                keyword: Some("cyber".into()),
            })
        );
    }
}
