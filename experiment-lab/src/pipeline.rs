//! The end-to-end analysis pipeline.
//!
//! ```text
//! corpus ─▶ CohortSelector ─▶ FeatureExtractor ─▶ Analyzer ─▶ Synthesizer ─▶ experiments
//! ```
//!
//! No stage performs I/O. Identical inputs give identical reports.

use tracing::{info, warn};

use content_signals::{ContentItem, FeatureRegistry};

use crate::cache::{AnalysisCache, CacheKey};
use crate::config::LabConfig;
use crate::mapping::SettingsMappingTable;
use crate::stages::{
    select_top, CancellationFlag, CohortSelector, ExperimentSynthesizer, FeatureExtractor,
    FrequencyDifferentialAnalyzer,
};
use crate::types::{AnalysisReport, Experiment, FeatureStat, RankedAnalysis, Result, SynthesisMode};

/// Composes cohort selection, extraction, analysis and synthesis.
pub struct AnalysisPipeline {
    registry: FeatureRegistry,
    mapping: SettingsMappingTable,
    config: LabConfig,
    cache: Option<AnalysisCache>,
}

impl AnalysisPipeline {
    /// Canonical registry and shipped mapping table, configured by `config`.
    pub fn new(config: LabConfig) -> Result<Self> {
        let registry = FeatureRegistry::standard_with_offset(config.features.utc_offset_secs());
        let mapping = SettingsMappingTable::standard()?;
        Self::with_components(registry, mapping, config)
    }

    /// Pipeline over custom components. The mapping table is checked against
    /// the registry here, once, rather than on every run.
    pub fn with_components(
        registry: FeatureRegistry,
        mapping: SettingsMappingTable,
        config: LabConfig,
    ) -> Result<Self> {
        config.validate()?;
        mapping.validate_against(&registry)?;

        let cache = config
            .general
            .cache_enabled
            .then(|| AnalysisCache::with_max_entries(config.general.cache_max_entries));

        Ok(Self {
            registry,
            mapping,
            config,
            cache,
        })
    }

    /// Feature registry in use.
    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Mapping table in use.
    pub fn mapping(&self) -> &SettingsMappingTable {
        &self.mapping
    }

    /// Active configuration.
    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    /// Memo cache, if enabled.
    pub fn cache(&self) -> Option<&AnalysisCache> {
        self.cache.as_ref()
    }

    /// Rank features at the configured quantile.
    pub fn analyze(&self, corpus: &[ContentItem]) -> Result<RankedAnalysis> {
        self.analyze_at(corpus, self.config.cohort.quantile)
    }

    /// Rank features at an explicit quantile.
    pub fn analyze_at(&self, corpus: &[ContentItem], quantile: f64) -> Result<RankedAnalysis> {
        self.analyze_inner(corpus, quantile, None)
    }

    /// Rank features, checking `cancel` between per-item extraction steps.
    pub fn analyze_cancellable(
        &self,
        corpus: &[ContentItem],
        quantile: f64,
        cancel: &CancellationFlag,
    ) -> Result<RankedAnalysis> {
        self.analyze_inner(corpus, quantile, Some(cancel))
    }

    fn analyze_inner(
        &self,
        corpus: &[ContentItem],
        quantile: f64,
        cancel: Option<&CancellationFlag>,
    ) -> Result<RankedAnalysis> {
        let cohort = CohortSelector::new().select(corpus, quantile)?;

        let key = self.cache.as_ref().map(|_| CacheKey::new(corpus, quantile));
        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                return Ok((*hit).clone());
            }
        }

        let extractor = FeatureExtractor::new(&self.registry);
        let population_vectors = match cancel {
            Some(flag) => extractor.extract_cancellable(&cohort.population, flag)?,
            None => extractor.extract(&cohort.population),
        };
        // The cohort is a prefix of the sorted population
        let cohort_vectors = &population_vectors[..cohort.cohort.len()];

        let stats = FrequencyDifferentialAnalyzer::new().analyze(cohort_vectors, &population_vectors);

        let analysis = RankedAnalysis {
            summary: cohort.summary,
            stats,
        };

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.insert(key, analysis.clone());
        }

        Ok(analysis)
    }

    /// Synthesize experiments for explicitly selected features.
    pub fn synthesize<S: AsRef<str>>(
        &self,
        selected: &[S],
        stats: &[FeatureStat],
        mode: SynthesisMode,
    ) -> Result<Vec<Experiment>> {
        let experiments =
            ExperimentSynthesizer::new(&self.registry, &self.mapping).synthesize(selected, stats, mode)?;
        Ok(experiments)
    }

    /// Full run: analyze, pick features, synthesize.
    ///
    /// Configured `feature_ids` take precedence over the ranking; otherwise
    /// the top `top_n` mapped features are used.
    pub fn run(&self, corpus: &[ContentItem]) -> Result<AnalysisReport> {
        let analysis = self.analyze(corpus)?;
        let synthesis = &self.config.synthesis;

        let selected = if synthesis.feature_ids.is_empty() {
            select_top(&analysis.stats, &self.mapping, synthesis.top_n)
        } else {
            synthesis.feature_ids.clone()
        };

        let experiments = if selected.is_empty() {
            warn!("No mapped feature is over-represented in the cohort, no experiments synthesized");
            Vec::new()
        } else {
            self.synthesize(&selected, &analysis.stats, synthesis.mode)?
        };

        info!(
            corpus = corpus.len(),
            cohort = analysis.summary.cohort_size,
            ranked = analysis.stats.len(),
            experiments = experiments.len(),
            mode = synthesis.mode.as_str(),
            "Analysis run complete"
        );

        Ok(AnalysisReport {
            summary: analysis.summary,
            stats: analysis.stats,
            mode: synthesis.mode,
            selected_feature_ids: selected,
            experiments,
        })
    }
}
