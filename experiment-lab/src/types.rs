//! Core types for the analysis pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use content_signals::{ContentItem, RegistryError, SettingKey};

use crate::mapping::MappingError;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Top performers and the full population they were drawn from.
#[derive(Debug, Clone)]
pub struct CohortResult<'a> {
    /// Top `cohort_size` items by engagement score
    pub cohort: Vec<&'a ContentItem>,
    /// Every item, sorted by engagement score descending
    pub population: Vec<&'a ContentItem>,
    /// Quantile used for selection
    pub quantile: f64,
    /// Aggregate numbers for reporting
    pub summary: CohortSummary,
}

/// Aggregate numbers describing a cohort selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSummary {
    pub quantile: f64,
    pub cohort_size: usize,
    pub population_size: usize,
    /// Lowest engagement score that made it into the cohort
    pub score_threshold: u64,
    pub cohort_mean_score: f64,
    pub population_mean_score: f64,
}

/// Detector results for one item, keyed by feature id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    /// Item the vector was computed for
    pub item_id: String,
    /// Feature id to presence
    pub values: BTreeMap<String, bool>,
}

impl FeatureVector {
    /// Whether a feature is present. Unknown ids read as absent.
    pub fn has(&self, feature_id: &str) -> bool {
        self.values.get(feature_id).copied().unwrap_or(false)
    }
}

/// Frequency comparison for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct FeatureStat {
    pub feature_id: String,
    /// Share of cohort items with the feature (0.0 - 1.0)
    pub frequency_in_cohort: f64,
    /// Share of population items with the feature (0.0 - 1.0)
    pub frequency_in_population: f64,
    /// `frequency_in_cohort - frequency_in_population`
    pub improvement_delta: f64,
    /// 1-based position in the ranking
    pub rank: usize,
    /// Cohort items with the feature
    pub cohort_count: usize,
    /// Population items with the feature
    pub population_count: usize,
}

/// Cohort summary and ranked features from one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedAnalysis {
    pub summary: CohortSummary,
    /// Features with positive delta, best first
    pub stats: Vec<FeatureStat>,
}

/// How an experiment was synthesized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// One experiment per selected feature
    #[default]
    Single,
    /// All selected features folded into one experiment
    Combined,
}

impl SynthesisMode {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Combined => "combined",
        }
    }
}

/// A synthesized bundle of generation settings.
///
/// Handed to the scheduling collaborator as-is and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    /// Deterministic id derived from mode and feature ids
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub mode: SynthesisMode,
    /// Features the settings were derived from, in application order
    pub base_feature_ids: Vec<String>,
    /// Settings restricted to the downstream vocabulary
    pub settings_template: BTreeMap<SettingKey, Value>,
    /// Expected performance score (0 - 100)
    pub expected_performance: f64,
    /// Confidence in the expectation (0.0 - 1.0)
    pub confidence_level: f64,
}

/// Rejected pipeline input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    /// No items to analyze
    #[error("Corpus is empty")]
    EmptyCorpus,

    /// Quantile outside (0, 1]
    #[error("Quantile {0} is outside (0, 1]")]
    InvalidQuantile(f64),
}

/// Synthesis failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// Selected feature has no settings mapping row
    #[error("No settings mapping for feature: {0}")]
    UnmappedFeature(String),

    /// Combined mode needs at least one feature
    #[error("No features selected for synthesis")]
    EmptySelection,
}

/// Error types for the lab.
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Synthesis error
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Mapping table error
    #[error("Mapping table error: {0}")]
    Mapping(#[from] MappingError),

    /// Feature registry error
    #[error("Feature registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Run cancelled between extraction steps
    #[error("Analysis cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, LabError>;

/// Everything a run produces, ready for the scheduling collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub summary: CohortSummary,
    pub stats: Vec<FeatureStat>,
    pub mode: SynthesisMode,
    /// Features handed to the synthesizer, in application order
    pub selected_feature_ids: Vec<String>,
    pub experiments: Vec<Experiment>,
}
