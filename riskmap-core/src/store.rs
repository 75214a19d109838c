//! Framework store: loads the framework catalog, the regulatory requirements
//! table and the compute-threshold reference from processed JSON files.
//!
//! A missing file is tolerated: the store logs a warning and substitutes the
//! documented default. A file that exists but does not match the schema is a
//! hard `ConfigError::Malformed`.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::config::DataConfig;
use crate::error::ConfigError;
use crate::types::{ComputeThresholdTable, Framework, RegulatoryRequirements};

#[derive(Deserialize)]
struct FrameworksDocument {
    #[serde(default)]
    frameworks: Vec<Framework>,
}

#[derive(Deserialize)]
struct RegulatoryDocument {
    #[serde(default = "RegulatoryRequirements::unspecified")]
    eu_ai_act: RegulatoryRequirements,
}

#[derive(Deserialize)]
struct ComputeThresholdDocument {
    #[serde(default = "empty_thresholds")]
    compute_thresholds: ComputeThresholdTable,
}

fn empty_thresholds() -> ComputeThresholdTable {
    ComputeThresholdTable::new(Vec::new())
}

/// Everything the matcher needs, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub frameworks: Vec<Framework>,
    pub regulatory: RegulatoryRequirements,
    pub compute_thresholds: ComputeThresholdTable,
}

impl Catalog {
    pub fn new(
        frameworks: Vec<Framework>,
        regulatory: RegulatoryRequirements,
        compute_thresholds: ComputeThresholdTable,
    ) -> Self {
        Self {
            frameworks,
            regulatory,
            compute_thresholds,
        }
    }

    /// Load all three sources from the configured data directory.
    pub fn load(data: &DataConfig) -> Result<Self, ConfigError> {
        let frameworks = load_frameworks(&data.frameworks_path())?;
        let regulatory = load_regulatory_requirements(&data.eu_requirements_path())?;
        let compute_thresholds = load_compute_thresholds(&data.compute_thresholds_path())?;

        let catalog = Self::new(frameworks, regulatory, compute_thresholds);
        tracing::info!(
            frameworks = catalog.frameworks.len(),
            tiers = catalog.total_tiers(),
            regulatory_threshold = catalog.regulatory.compute_threshold_flops,
            reference_thresholds = catalog.compute_thresholds.len(),
            "Catalog loaded from {}",
            data.data_dir.display()
        );
        Ok(catalog)
    }

    pub fn total_tiers(&self) -> usize {
        self.frameworks.iter().map(|f| f.risk_tiers.len()).sum()
    }
}

/// Read and parse `path`, or `None` if it does not exist.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| ConfigError::malformed(path, e.to_string()))
}

/// Load the framework catalog. Missing file yields an empty catalog.
pub fn load_frameworks(path: &Path) -> Result<Vec<Framework>, ConfigError> {
    let Some(doc) = read_document::<FrameworksDocument>(path)? else {
        tracing::warn!("{} not found, using empty framework list", path.display());
        return Ok(Vec::new());
    };
    for framework in &doc.frameworks {
        validate_framework(framework).map_err(|message| ConfigError::malformed(path, message))?;
    }
    Ok(doc.frameworks)
}

/// Load the regulatory requirements. Missing file yields the EU AI Act defaults.
pub fn load_regulatory_requirements(path: &Path) -> Result<RegulatoryRequirements, ConfigError> {
    let Some(doc) = read_document::<RegulatoryDocument>(path)? else {
        tracing::warn!("{} not found, using default EU AI Act requirements", path.display());
        return Ok(RegulatoryRequirements::default());
    };
    let threshold = doc.eu_ai_act.compute_threshold_flops;
    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(ConfigError::malformed(
            path,
            format!("eu_ai_act.compute_threshold_flops must be positive (got {})", threshold),
        ));
    }
    Ok(doc.eu_ai_act)
}

/// Load the compute-threshold reference table. Missing file yields the single
/// 10^25 entry.
pub fn load_compute_thresholds(path: &Path) -> Result<ComputeThresholdTable, ConfigError> {
    let Some(doc) = read_document::<ComputeThresholdDocument>(path)? else {
        tracing::warn!("{} not found, using default compute thresholds", path.display());
        return Ok(ComputeThresholdTable::default());
    };
    if let Some(bad) = doc
        .compute_thresholds
        .thresholds
        .iter()
        .find(|t| !t.threshold_flops.is_finite() || t.threshold_flops < 0.0)
    {
        return Err(ConfigError::malformed(
            path,
            format!("threshold_flops must be non-negative (got {})", bad.threshold_flops),
        ));
    }
    Ok(doc.compute_thresholds)
}

fn validate_framework(framework: &Framework) -> Result<(), String> {
    for tier in &framework.risk_tiers {
        if tier.tier_name.trim().is_empty() {
            return Err(format!(
                "framework '{}' has a tier with an empty tier_name",
                framework.display_name()
            ));
        }
        if let Some(flops) = tier.compute_threshold_flops {
            if !flops.is_finite() || flops < 0.0 {
                return Err(format!(
                    "tier '{}' in framework '{}' has invalid compute_threshold_flops {}",
                    tier.tier_name,
                    framework.display_name(),
                    flops
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_sources_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let catalog = Catalog::load(&data).unwrap();
        assert!(catalog.frameworks.is_empty());
        assert_eq!(catalog.regulatory, RegulatoryRequirements::default());
        assert_eq!(catalog.compute_thresholds, ComputeThresholdTable::default());
        assert_eq!(catalog.compute_thresholds.thresholds[0].scientific_notation, "10^25");
    }

    #[test]
    fn test_load_frameworks_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "frameworks.json",
            r#"{"frameworks": [
                {"organization": "Anthropic", "framework_name": "RSP", "risk_tiers": [
                    {"tier_name": "ASL-3", "tier_level": 3, "capability_threshold": "CBRN uplift",
                     "compute_threshold_flops": null, "evaluation_requirements": ["METR bio eval"],
                     "required_safeguards": ["Enhanced security"]}
                ]},
                {"organization": "Google DeepMind", "framework_name": "FSF", "risk_tiers": []}
            ]}"#,
        );
        let frameworks = load_frameworks(&path).unwrap();
        assert_eq!(frameworks.len(), 2);
        assert_eq!(frameworks[0].display_name(), "RSP");
        assert_eq!(frameworks[1].display_name(), "FSF");
        assert_eq!(frameworks[0].risk_tiers[0].evaluation_requirements, vec!["METR bio eval"]);
    }

    #[test]
    fn test_missing_frameworks_key_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "frameworks.json", "{}");
        assert!(load_frameworks(&path).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "frameworks.json", "{\"frameworks\": [");
        let err = load_frameworks(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_wrong_types_are_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "frameworks.json",
            r#"{"frameworks": [{"risk_tiers": [{"tier_name": "X", "tier_level": "high"}]}]}"#,
        );
        assert!(matches!(
            load_frameworks(&path),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_negative_tier_threshold_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "frameworks.json",
            r#"{"frameworks": [{"framework_name": "F", "risk_tiers": [
                {"tier_name": "X", "tier_level": 1, "compute_threshold_flops": -1e20}
            ]}]}"#,
        );
        let err = load_frameworks(&path).unwrap_err();
        assert!(err.to_string().contains("invalid compute_threshold_flops"));
    }

    #[test]
    fn test_regulatory_file_without_section_keeps_threshold_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "eu_compliance.json", "{}");
        let reqs = load_regulatory_requirements(&path).unwrap();
        assert_eq!(reqs, RegulatoryRequirements::unspecified());
    }

    #[test]
    fn test_regulatory_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "eu_compliance.json",
            r#"{"eu_ai_act": {"compute_threshold_flops": 1e24,
                "required_evaluations": ["Systemic risk assessment"],
                "documentation_requirements": []}}"#,
        );
        let reqs = load_regulatory_requirements(&path).unwrap();
        assert_eq!(reqs.compute_threshold_flops, 1e24);
        assert_eq!(reqs.required_evaluations, vec!["Systemic risk assessment"]);
    }

    #[test]
    fn test_zero_regulatory_threshold_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "eu_compliance.json",
            r#"{"eu_ai_act": {"compute_threshold_flops": 0}}"#,
        );
        assert!(load_regulatory_requirements(&path).is_err());
    }

    #[test]
    fn test_compute_thresholds_without_section_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "compute_thresholds.json", "{}");
        assert!(load_compute_thresholds(&path).unwrap().is_empty());
    }

    #[test]
    fn test_compute_thresholds_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "compute_thresholds.json",
            r#"{"compute_thresholds": [
                {"threshold_flops": 1e26, "scientific_notation": "10^26",
                 "triggers": ["US Executive Order reporting"], "year_defined": 2023},
                {"threshold_flops": 1e25, "scientific_notation": "10^25",
                 "triggers": ["EU AI Act systemic risk"]}
            ]}"#,
        );
        let table = load_compute_thresholds(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.thresholds[0].year_defined, Some(2023));
        assert_eq!(table.thresholds[1].year_defined, None);
    }
}
