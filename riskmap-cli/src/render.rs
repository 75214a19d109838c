//! Plain-text rendering of assessments and catalog views.

use riskmap_core::coverage::{CategoryCoverage, TierCount};
use riskmap_core::{
    BELOW_THRESHOLD, Catalog, ComputeThreshold, ComputeThresholdTable, MatchReason,
    RiskAssessment,
};
use serde::Serialize;

/// Why one framework assigned its tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub framework: String,
    pub tier: String,
    pub reason: MatchReason,
}

pub fn assessment(
    assessment: &RiskAssessment,
    regulatory_threshold: f64,
    exceeded: &[&ComputeThreshold],
    explanations: &[Explanation],
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Risk assessment: {}\n", assessment.model_name));
    out.push('\n');

    out.push_str("Framework assessments:\n");
    if assessment.framework_assessments.is_empty() {
        out.push_str("  No framework thresholds triggered\n");
    }
    for (framework, tier) in &assessment.framework_assessments {
        let marker = if tier == BELOW_THRESHOLD { " " } else { "!" };
        out.push_str(&format!("  {} {}: {}\n", marker, framework, tier));
    }

    if !explanations.is_empty() {
        out.push('\n');
        out.push_str("Match reasons:\n");
        for e in explanations {
            out.push_str(&format!("  {} -> {}: {}\n", e.framework, e.tier, e.reason));
        }
    }

    out.push('\n');
    out.push_str("EU AI Act compliance:\n");
    if assessment.eu_compliant {
        out.push_str(&format!(
            "  Below the systemic risk threshold ({:e} FLOPs)\n",
            regulatory_threshold
        ));
    } else {
        out.push_str(&format!(
            "  Exceeds the systemic risk threshold ({:e} FLOPs)\n",
            regulatory_threshold
        ));
        if !assessment.eu_requirements.is_empty() {
            out.push_str("  Required actions:\n");
            for req in &assessment.eu_requirements {
                out.push_str(&format!("    - {}\n", req));
            }
        }
    }

    if !exceeded.is_empty() {
        out.push('\n');
        out.push_str("Compute thresholds reached:\n");
        for t in exceeded {
            out.push_str(&format!("  {}: {}\n", notation(t), t.triggers.join(", ")));
        }
    }

    if !assessment.gaps_identified.is_empty() {
        out.push('\n');
        out.push_str("Framework discrepancies:\n");
        for gap in &assessment.gaps_identified {
            out.push_str(&format!("  - {}\n", gap));
        }
    }

    out
}

pub fn frameworks(catalog: &Catalog) -> String {
    let mut out = String::new();
    if catalog.frameworks.is_empty() {
        out.push_str("No frameworks loaded. Run the extraction pipeline first.\n");
        return out;
    }
    for fw in &catalog.frameworks {
        let org = fw.organization.as_deref().unwrap_or("Unknown");
        let name = fw.framework_name.as_deref().unwrap_or("Unknown");
        out.push_str(&format!("{} - {}\n", org, name));
        for tier in &fw.risk_tiers {
            out.push_str(&format!("  {} (level {})\n", tier.tier_name, tier.tier_level));
            out.push_str(&format!("    Threshold: {}\n", tier.capability_threshold));
            if let Some(flops) = tier.compute_trigger() {
                out.push_str(&format!("    Compute: {:e} FLOPs\n", flops));
            }
            if !tier.evaluation_requirements.is_empty() {
                out.push_str(&format!("    Evals: {}\n", tier.evaluation_requirements.join(", ")));
            }
            if !tier.required_safeguards.is_empty() {
                out.push_str(&format!("    Safeguards: {}\n", tier.required_safeguards.join(", ")));
            }
        }
    }
    out
}

pub fn coverage(counts: &[TierCount], coverage: &[CategoryCoverage]) -> String {
    let mut out = String::new();
    out.push_str("Risk tiers per framework:\n");
    for c in counts {
        out.push_str(&format!("  {} ({}): {}\n", c.organization, c.framework, c.tiers));
    }
    out.push('\n');
    out.push_str("Capability coverage across frameworks:\n");
    if coverage.is_empty() {
        out.push_str("  (no capability categories found)\n");
    }
    for c in coverage {
        out.push_str(&format!("  {}: {}\n", c.category, c.organizations.join(", ")));
    }
    out
}

pub fn thresholds(table: &ComputeThresholdTable) -> String {
    let mut out = String::new();
    if table.is_empty() {
        out.push_str("Compute threshold data not available\n");
        return out;
    }
    for t in &table.thresholds {
        let year = t.year_defined.map(|y| format!(" ({})", y)).unwrap_or_default();
        out.push_str(&format!("{}{}: {}\n", notation(t), year, t.triggers.join(", ")));
    }
    out
}

fn notation(t: &ComputeThreshold) -> String {
    if t.scientific_notation.is_empty() {
        format!("{:e}", t.threshold_flops)
    } else {
        t.scientific_notation.clone()
    }
}
