//! Catalog analytics: how many tiers each framework defines and which
//! organizations cover each broad capability category.

use serde::Serialize;

use crate::store::Catalog;

/// Broad capability categories recognised in tier threshold text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CapabilityCategory {
    #[serde(rename = "CBRN")]
    Cbrn,
    Cyber,
    Autonomy,
    Persuasion,
}

impl CapabilityCategory {
    pub const ALL: [CapabilityCategory; 4] = [
        CapabilityCategory::Cbrn,
        CapabilityCategory::Cyber,
        CapabilityCategory::Autonomy,
        CapabilityCategory::Persuasion,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CapabilityCategory::Cbrn => "CBRN",
            CapabilityCategory::Cyber => "Cyber",
            CapabilityCategory::Autonomy => "Autonomy",
            CapabilityCategory::Persuasion => "Persuasion",
        }
    }

    /// Whether threshold text mentions this category. Case-sensitive.
    fn mentioned_in(&self, text: &str) -> bool {
        match self {
            CapabilityCategory::Cbrn => text.contains("CBRN") || text.contains("bio"),
            CapabilityCategory::Cyber => text.contains("cyber"),
            CapabilityCategory::Autonomy => {
                text.contains("autonomy") || text.contains("autonomous")
            }
            CapabilityCategory::Persuasion => text.contains("persuasion"),
        }
    }

    /// Whether a tier covers this category: its lower-cased threshold text
    /// contains the lower-cased label.
    fn covered_by(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.label().to_lowercase())
    }
}

impl std::fmt::Display for CapabilityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Organizations covering one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCoverage {
    pub category: CapabilityCategory,
    pub organizations: Vec<String>,
}

/// Number of tiers a framework defines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierCount {
    pub organization: String,
    pub framework: String,
    pub tiers: usize,
}

pub fn tier_counts(catalog: &Catalog) -> Vec<TierCount> {
    catalog
        .frameworks
        .iter()
        .map(|fw| TierCount {
            organization: fw.organization_name().to_string(),
            framework: fw.display_name().to_string(),
            tiers: fw.risk_tiers.len(),
        })
        .collect()
}

/// Coverage for every category mentioned anywhere in the catalog.
pub fn capability_coverage(catalog: &Catalog) -> Vec<CategoryCoverage> {
    let texts = || {
        catalog
            .frameworks
            .iter()
            .flat_map(|fw| fw.risk_tiers.iter().map(|t| t.capability_threshold.as_str()))
    };

    CapabilityCategory::ALL
        .into_iter()
        .filter(|category| texts().any(|text| category.mentioned_in(text)))
        .map(|category| {
            let mut organizations: Vec<String> = Vec::new();
            for fw in &catalog.frameworks {
                let covers = fw
                    .risk_tiers
                    .iter()
                    .any(|t| category.covered_by(&t.capability_threshold));
                let org = fw.organization_name();
                if covers && !organizations.iter().any(|o| o == org) {
                    organizations.push(org.to_string());
                }
            }
            CategoryCoverage {
                category,
                organizations,
            }
        })
        .collect()
}
