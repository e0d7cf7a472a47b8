//! Configuration for analysis runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{LabError, Result, SynthesisMode};

/// Configuration for an analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Cohort selection
    pub cohort: CohortConfig,
    /// Feature extraction
    pub features: FeatureConfig,
    /// Experiment synthesis
    pub synthesis: SynthesisConfig,
    /// General settings
    pub general: GeneralConfig,
}

impl LabConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Load and validate config from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LabError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&content)
            .map_err(|e| LabError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let q = self.cohort.quantile;
        if !(q > 0.0 && q <= 1.0) {
            return Err(LabError::ConfigError(format!(
                "cohort.quantile must be in (0, 1], got {}",
                q
            )));
        }
        if !(-12..=14).contains(&self.features.utc_offset_hours) {
            return Err(LabError::ConfigError(format!(
                "features.utc_offset_hours must be in [-12, 14], got {}",
                self.features.utc_offset_hours
            )));
        }
        if self.synthesis.top_n == 0 && self.synthesis.feature_ids.is_empty() {
            return Err(LabError::ConfigError(
                "synthesis.top_n must be at least 1 when no feature_ids are given".to_string(),
            ));
        }
        if self.general.cache_enabled && self.general.cache_max_entries == 0 {
            return Err(LabError::ConfigError(
                "general.cache_max_entries must be at least 1 when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cohort selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CohortConfig {
    /// Share of the corpus treated as top performers (0.0 - 1.0]
    pub quantile: f64,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self { quantile: 0.2 }
    }
}

/// Feature extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Offset used to read posting hours
    pub utc_offset_hours: i32,
}

impl FeatureConfig {
    /// Offset in seconds.
    pub fn utc_offset_secs(&self) -> i32 {
        self.utc_offset_hours * 3600
    }
}

/// Synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Single or combined experiments
    pub mode: SynthesisMode,
    /// How many ranked features to pick when none are given
    pub top_n: usize,
    /// Operator-selected features; overrides ranking when non-empty
    pub feature_ids: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            mode: SynthesisMode::Single,
            top_n: 3,
            feature_ids: Vec::new(),
        }
    }
}

/// General configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level
    pub log_level: String,
    /// Memoize analysis results per corpus and quantile
    pub cache_enabled: bool,
    /// Most results the cache holds before evicting
    pub cache_max_entries: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            cache_enabled: false,
            cache_max_entries: crate::cache::DEFAULT_MAX_ENTRIES,
        }
    }
}
