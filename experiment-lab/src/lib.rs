//! Experiment Lab - feature-frequency differential analysis
//!
//! Finds which content attributes are over-represented among top-performing
//! items and turns them into generation-setting bundles ("experiments") for
//! an external scheduler:
//!
//! - **Cohort selection**: top quantile by engagement score, stable tie-break
//! - **Feature extraction**: every registry detector applied to every item
//! - **Differential analysis**: cohort vs population frequency, ranked by delta
//! - **Experiment synthesis**: ranked features mapped onto a fixed settings vocabulary
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      AnalysisPipeline                         │
//! │                                                               │
//! │  ┌────────┐   ┌───────────┐   ┌──────────┐   ┌─────────────┐  │
//! │  │ Cohort │──▶│ Extractor │──▶│ Analyzer │──▶│ Synthesizer │  │
//! │  └────────┘   └───────────┘   └──────────┘   └─────────────┘  │
//! │                     │                               │         │
//! │             ┌───────▼────────┐             ┌────────▼──────┐  │
//! │             │FeatureRegistry │             │ MappingTable  │  │
//! │             └────────────────┘             └───────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use content_signals::{ContentItem, Engagement};
//! use experiment_lab::{AnalysisPipeline, LabConfig};
//!
//! let at = Utc::now();
//! let corpus = vec![
//!     ContentItem::new("1", "a", at)
//!         .with_title("Is the rally over?")
//!         .with_engagement(Engagement { likes: 40, ..Default::default() }),
//!     ContentItem::new("2", "a", at).with_title("Market close"),
//! ];
//!
//! let mut config = LabConfig::default();
//! config.cohort.quantile = 0.5;
//! let report = AnalysisPipeline::new(config)?.run(&corpus)?;
//! assert_eq!(report.stats[0].feature_id, "has_question");
//! # Ok::<(), experiment_lab::LabError>(())
//! ```

pub mod cache;
pub mod config;
pub mod mapping;
pub mod pipeline;
pub mod stages;
pub mod types;

// Re-export main types
pub use cache::{AnalysisCache, CacheKey};
pub use config::LabConfig;
pub use mapping::{MappingError, SettingsMappingRow, SettingsMappingTable};
pub use pipeline::AnalysisPipeline;
pub use stages::{
    CancellationFlag, CohortSelector, ExperimentSynthesizer, FeatureExtractor,
    FrequencyDifferentialAnalyzer,
};
pub use types::*;
