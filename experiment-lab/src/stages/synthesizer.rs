//! Experiment synthesizer - turns ranked features into generation settings.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use content_signals::{FeatureRegistry, SettingKey};

use crate::mapping::SettingsMappingTable;
use crate::types::{Experiment, FeatureStat, SynthesisError, SynthesisMode};

/// Baseline expected performance before any delta is applied.
const BASE_PERFORMANCE: f64 = 60.0;
/// Performance points per unit of improvement delta.
const PERFORMANCE_PER_DELTA: f64 = 40.0;
/// Baseline confidence before any delta is applied.
const BASE_CONFIDENCE: f64 = 0.5;
/// Confidence per unit of improvement delta.
const CONFIDENCE_PER_DELTA: f64 = 2.0;
/// Confidence never exceeds this.
const MAX_CONFIDENCE: f64 = 0.9;

/// Builds [`Experiment`]s from selected features and a mapping table.
pub struct ExperimentSynthesizer<'a> {
    registry: &'a FeatureRegistry,
    mapping: &'a SettingsMappingTable,
}

impl<'a> ExperimentSynthesizer<'a> {
    /// Create a synthesizer.
    pub fn new(registry: &'a FeatureRegistry, mapping: &'a SettingsMappingTable) -> Self {
        Self { registry, mapping }
    }

    /// Synthesize experiments for `selected` in the given mode.
    ///
    /// Every selected id must have a mapping row; otherwise nothing is produced.
    pub fn synthesize<S: AsRef<str>>(
        &self,
        selected: &[S],
        stats: &[FeatureStat],
        mode: SynthesisMode,
    ) -> Result<Vec<Experiment>, SynthesisError> {
        match mode {
            SynthesisMode::Single => self.single(selected, stats),
            SynthesisMode::Combined => self.combined(selected, stats).map(|e| vec![e]),
        }
    }

    /// One experiment per selected feature. Repeated ids are synthesized once.
    pub fn single<S: AsRef<str>>(
        &self,
        selected: &[S],
        stats: &[FeatureStat],
    ) -> Result<Vec<Experiment>, SynthesisError> {
        self.ensure_mapped(selected)?;

        let mut seen: HashSet<&str> = HashSet::new();
        let experiments: Vec<Experiment> = selected
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|id| seen.insert(*id))
            .map(|id| {
                let stat = find_stat(stats, id);
                let delta = stat.map(|s| s.improvement_delta).unwrap_or(0.0);
                let ids = vec![id.to_string()];

                Experiment {
                    id: experiment_id(SynthesisMode::Single, &ids),
                    name: format!("{} experiment", self.display_name(id)),
                    description: describe_single(id, stat),
                    mode: SynthesisMode::Single,
                    settings_template: self.template(&ids),
                    base_feature_ids: ids,
                    expected_performance: expected_performance(delta),
                    confidence_level: confidence_level(delta),
                }
            })
            .collect();

        debug!(experiments = experiments.len(), "Synthesized single-feature experiments");
        Ok(experiments)
    }

    /// One experiment folding every selected feature in order.
    ///
    /// Later features override keys set by earlier ones. Keys nobody overrides
    /// keep the table's always-on defaults.
    pub fn combined<S: AsRef<str>>(
        &self,
        selected: &[S],
        stats: &[FeatureStat],
    ) -> Result<Experiment, SynthesisError> {
        if selected.is_empty() {
            return Err(SynthesisError::EmptySelection);
        }
        self.ensure_mapped(selected)?;

        let ids: Vec<String> = selected.iter().map(|s| s.as_ref().to_string()).collect();
        let deltas: Vec<f64> = ids
            .iter()
            .map(|id| find_stat(stats, id).map(|s| s.improvement_delta).unwrap_or(0.0))
            .collect();
        let mean_delta = deltas.iter().sum::<f64>() / deltas.len() as f64;

        let names: Vec<&str> = ids.iter().map(|id| self.display_name(id)).collect();

        let experiment = Experiment {
            id: experiment_id(SynthesisMode::Combined, &ids),
            name: format!("Combined: {}", names.join(" + ")),
            description: format!(
                "Settings from {} features applied in order: {}",
                ids.len(),
                ids.join(", ")
            ),
            mode: SynthesisMode::Combined,
            settings_template: self.template(&ids),
            base_feature_ids: ids,
            expected_performance: expected_performance(mean_delta),
            confidence_level: confidence_level(mean_delta),
        };

        debug!(
            features = experiment.base_feature_ids.len(),
            mean_delta,
            "Synthesized combined experiment"
        );
        Ok(experiment)
    }

    /// Merge defaults and each feature's overrides, last one wins.
    fn template(&self, ids: &[String]) -> BTreeMap<SettingKey, Value> {
        let mut template = self.mapping.defaults.clone();
        for id in ids {
            if let Some(row) = self.mapping.get(id) {
                for (key, value) in &row.overrides {
                    template.insert(*key, value.clone());
                }
            }
        }
        template
    }

    fn ensure_mapped<S: AsRef<str>>(&self, selected: &[S]) -> Result<(), SynthesisError> {
        match selected
            .iter()
            .map(AsRef::<str>::as_ref)
            .find(|id| !self.mapping.contains(id))
        {
            Some(id) => Err(SynthesisError::UnmappedFeature(id.to_string())),
            None => Ok(()),
        }
    }

    fn display_name<'s>(&'s self, id: &'s str) -> &'s str {
        self.registry
            .get(id)
            .map(|f| f.display_name.as_str())
            .unwrap_or(id)
    }
}

/// First `n` ranked features that have a mapping row.
pub fn select_top(stats: &[FeatureStat], mapping: &SettingsMappingTable, n: usize) -> Vec<String> {
    stats
        .iter()
        .filter(|s| mapping.contains(&s.feature_id))
        .take(n)
        .map(|s| s.feature_id.clone())
        .collect()
}

/// `clamp(60 + delta * 40, 0, 100)`
pub fn expected_performance(delta: f64) -> f64 {
    (BASE_PERFORMANCE + delta * PERFORMANCE_PER_DELTA).clamp(0.0, 100.0)
}

/// `clamp(0.5 + delta * 2, 0, 0.9)`
pub fn confidence_level(delta: f64) -> f64 {
    (BASE_CONFIDENCE + delta * CONFIDENCE_PER_DELTA).clamp(0.0, MAX_CONFIDENCE)
}

fn find_stat<'s>(stats: &'s [FeatureStat], id: &str) -> Option<&'s FeatureStat> {
    let stat = stats.iter().find(|s| s.feature_id == id);
    if stat.is_none() {
        warn!(feature_id = %id, "Selected feature is not in the ranking, using zero delta");
    }
    stat
}

fn experiment_id(mode: SynthesisMode, ids: &[String]) -> Uuid {
    let key = format!("{}:{}", mode.as_str(), ids.join(","));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

fn describe_single(id: &str, stat: Option<&FeatureStat>) -> String {
    match stat {
        Some(s) => format!(
            "{}: {:.0}% of top performers vs {:.0}% overall (+{:.1} pts)",
            id,
            s.frequency_in_cohort * 100.0,
            s.frequency_in_population * 100.0,
            s.improvement_delta * 100.0
        ),
        None => format!("{}: not over-represented among top performers", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_signals::registry::ids;
    use serde_json::json;

    fn stat(id: &str, delta: f64, rank: usize) -> FeatureStat {
        FeatureStat {
            feature_id: id.to_string(),
            frequency_in_cohort: 0.5 + delta / 2.0,
            frequency_in_population: 0.5 - delta / 2.0,
            improvement_delta: delta,
            rank,
            cohort_count: 1,
            population_count: 1,
        }
    }

    fn fixtures() -> (FeatureRegistry, SettingsMappingTable) {
        (FeatureRegistry::standard(), SettingsMappingTable::standard().unwrap())
    }

    #[test]
    fn test_score_formulas() {
        assert_eq!(expected_performance(0.0), 60.0);
        assert_eq!(expected_performance(0.5), 80.0);
        assert_eq!(expected_performance(1.0), 100.0);
        assert_eq!(confidence_level(0.0), 0.5);
        assert_eq!(confidence_level(0.1), 0.7);
        assert_eq!(confidence_level(0.7), MAX_CONFIDENCE);
    }

    #[test]
    fn test_single_equals_row_over_defaults() {
        let (registry, mapping) = fixtures();
        let synthesizer = ExperimentSynthesizer::new(&registry, &mapping);
        let stats = vec![stat(ids::HAS_TECHNICAL_ANALYSIS, 0.4, 1)];

        let experiments = synthesizer.single(&[ids::HAS_TECHNICAL_ANALYSIS], &stats).unwrap();
        assert_eq!(experiments.len(), 1);

        let mut expected = mapping.defaults.clone();
        expected.extend(mapping.get(ids::HAS_TECHNICAL_ANALYSIS).unwrap().overrides.clone());
        assert_eq!(experiments[0].settings_template, expected);
        assert_eq!(experiments[0].expected_performance, 76.0);
        assert_eq!(experiments[0].confidence_level, 0.9);
        assert_eq!(experiments[0].name, "Technical analysis vocabulary experiment");
    }

    #[test]
    fn test_combined_last_wins() {
        let (registry, mapping) = fixtures();
        let synthesizer = ExperimentSynthesizer::new(&registry, &mapping);

        let long_then_short = synthesizer
            .combined(&[ids::CONTENT_LENGTH_LONG, ids::CONTENT_LENGTH_SHORT], &[])
            .unwrap();
        let template = &long_then_short.settings_template;
        assert_eq!(template[&SettingKey::ContentLength], json!("short"));
        assert_eq!(template[&SettingKey::MaxWords], json!(150));
        // Short content turns off the always-on news links
        assert_eq!(template[&SettingKey::EnableNewsLinks], json!(false));
        // Set only by the earlier feature, so it survives
        assert_eq!(template[&SettingKey::IncludeCharts], json!(true));
        // Untouched default
        assert_eq!(template[&SettingKey::IncludeRiskWarning], json!(true));

        let short_then_long = synthesizer
            .combined(&[ids::CONTENT_LENGTH_SHORT, ids::CONTENT_LENGTH_LONG], &[])
            .unwrap();
        assert_eq!(short_then_long.settings_template[&SettingKey::ContentLength], json!("long"));
        assert_ne!(long_then_short.id, short_then_long.id);
    }

    #[test]
    fn test_unmapped_feature_produces_nothing() {
        let (registry, mapping) = fixtures();
        let synthesizer = ExperimentSynthesizer::new(&registry, &mapping);

        for mode in [SynthesisMode::Single, SynthesisMode::Combined] {
            let err = synthesizer
                .synthesize(&[ids::HAS_QUESTION, ids::MORNING_POSTING], &[], mode)
                .unwrap_err();
            assert_eq!(err, SynthesisError::UnmappedFeature(ids::MORNING_POSTING.to_string()));
        }
    }

    #[test]
    fn test_combined_requires_selection() {
        let (registry, mapping) = fixtures();
        let synthesizer = ExperimentSynthesizer::new(&registry, &mapping);
        let none: [&str; 0] = [];
        assert_eq!(
            synthesizer.combined(&none, &[]).unwrap_err(),
            SynthesisError::EmptySelection
        );
        assert!(synthesizer.single(&none, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_select_top_skips_unmapped() {
        let (_, mapping) = fixtures();
        let stats = vec![
            stat(ids::EVENING_POSTING, 0.6, 1),
            stat(ids::HAS_QUESTION, 0.5, 2),
            stat(ids::MULTI_TAGS, 0.3, 3),
            stat(ids::HAS_EMOJI, 0.2, 4),
            stat(ids::HAS_HASHTAG, 0.1, 5),
        ];
        assert_eq!(
            select_top(&stats, &mapping, 3),
            vec![ids::HAS_QUESTION, ids::MULTI_TAGS, ids::HAS_EMOJI]
        );
    }

    #[test]
    fn test_ids_are_deterministic() {
        let (registry, mapping) = fixtures();
        let synthesizer = ExperimentSynthesizer::new(&registry, &mapping);
        let first = synthesizer.single(&[ids::HAS_EMOJI, ids::HAS_EMOJI], &[]).unwrap();
        let second = synthesizer.single(&[ids::HAS_EMOJI], &[]).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }
}
