//! Configuration system for riskmap.
//!
//! Uses `figment` for layered configuration: defaults -> user config -> workspace
//! config -> environment -> explicit overrides. Configuration is read from
//! `~/.config/riskmap/config.toml` and/or `.riskmap/config.toml` in the workspace.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskmapConfig {
    /// Where the processed catalog files live.
    pub data: DataConfig,
    /// Capability matching options.
    pub matching: MatchingConfig,
}

/// Locations of the three catalog sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the processed JSON files. Relative paths resolve
    /// against the workspace.
    pub data_dir: PathBuf,
    pub frameworks_file: String,
    pub eu_requirements_file: String,
    pub compute_thresholds_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/processed"),
            frameworks_file: "frameworks.json".into(),
            eu_requirements_file: "eu_compliance.json".into(),
            compute_thresholds_file: "compute_thresholds.json".into(),
        }
    }
}

impl DataConfig {
    pub fn frameworks_path(&self) -> PathBuf {
        self.data_dir.join(&self.frameworks_file)
    }

    pub fn eu_requirements_path(&self) -> PathBuf {
        self.data_dir.join(&self.eu_requirements_file)
    }

    pub fn compute_thresholds_path(&self) -> PathBuf {
        self.data_dir.join(&self.compute_thresholds_file)
    }

    /// Anchor a relative `data_dir` at `workspace`.
    pub fn resolve_against(&mut self, workspace: &Path) {
        if self.data_dir.is_relative() {
            self.data_dir = workspace.join(&self.data_dir);
        }
    }
}

/// Options for the capability trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Keywords that link a capability label to a tier's threshold text when
    /// both contain them. Compared lower-cased.
    pub risk_keywords: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            risk_keywords: vec![
                "cbrn".into(),
                "cyber".into(),
                "autonom".into(),
                "persuasion".into(),
            ],
        }
    }
}

impl MatchingConfig {
    /// Blank keywords are rejected: the empty string is contained in every text.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(empty) = self.risk_keywords.iter().find(|k| k.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                message: format!("risk keyword {:?} is blank and would match every text", empty),
            });
        }
        Ok(())
    }
}

impl RiskmapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matching.validate()?;
        for (field, value) in [
            ("frameworks_file", &self.data.frameworks_file),
            ("eu_requirements_file", &self.data.eu_requirements_file),
            ("compute_thresholds_file", &self.data.compute_thresholds_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("data.{} must not be empty", field),
                });
            }
        }
        Ok(())
    }
}

/// Values given explicitly by the caller (CLI flags). They take precedence
/// over every file and environment layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub data_dir: Option<PathBuf>,
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "riskmap", "riskmap")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".riskmap").join("config.toml")
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `RISKMAP_`)
/// 3. Workspace-local config (`.riskmap/config.toml`)
/// 4. User config (`~/.config/riskmap/config.toml`)
/// 5. Built-in defaults
///
/// A relative `data.data_dir` is resolved against `workspace` when one is given.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ConfigOverrides>,
) -> Result<RiskmapConfig, ConfigError> {
    // RISKMAP_DATA__DATA_DIR, RISKMAP_MATCHING__RISK_KEYWORDS, ...
    let figment = file_layers(user_config_path().as_deref(), workspace)
        .merge(Env::prefixed("RISKMAP_").split("__"));
    extract_config(figment, workspace, overrides)
}

/// Defaults, then the user file, then the workspace file.
fn file_layers(user_config: Option<&Path>, workspace: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(RiskmapConfig::default()));

    if let Some(user_config) = user_config {
        if user_config.exists() {
            figment = figment.merge(Toml::file(user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment
}

fn extract_config(
    mut figment: Figment,
    workspace: Option<&Path>,
    overrides: Option<&ConfigOverrides>,
) -> Result<RiskmapConfig, ConfigError> {
    if let Some(data_dir) = overrides.and_then(|o| o.data_dir.as_ref()) {
        figment = figment.merge(Serialized::default("data.data_dir", data_dir));
    }

    let mut config: RiskmapConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    if let Some(ws) = workspace {
        config.data.resolve_against(ws);
    }
    Ok(config)
}

/// Whether a user-level or workspace-level config file exists.
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}
