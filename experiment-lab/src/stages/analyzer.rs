//! Frequency differential analyzer - ranks features by how much more often
//! they appear among top performers than in the population.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::types::{FeatureStat, FeatureVector};

/// Compares feature frequencies between cohort and population.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyDifferentialAnalyzer;

impl FrequencyDifferentialAnalyzer {
    /// Create a new analyzer.
    pub fn new() -> Self {
        Self
    }

    /// Rank features by `improvement_delta`, descending, ties by feature id.
    ///
    /// Only features with a strictly positive delta are returned. An empty
    /// result is not an error.
    pub fn analyze(
        &self,
        cohort_vectors: &[FeatureVector],
        population_vectors: &[FeatureVector],
    ) -> Vec<FeatureStat> {
        let feature_ids: BTreeSet<&str> = cohort_vectors
            .iter()
            .chain(population_vectors)
            .flat_map(|v| v.values.keys().map(String::as_str))
            .collect();

        // Every frequency shares the denominator k * n, so deltas compare
        // exactly as integers
        let k = cohort_vectors.len().max(1) as i128;
        let n = population_vectors.len().max(1) as i128;

        let mut scored: Vec<(i128, FeatureStat)> = feature_ids
            .into_iter()
            .map(|id| {
                let cohort_count = count(cohort_vectors, id);
                let population_count = count(population_vectors, id);
                let numerator = cohort_count as i128 * n - population_count as i128 * k;

                let stat = FeatureStat {
                    feature_id: id.to_string(),
                    frequency_in_cohort: frequency(cohort_count, cohort_vectors.len()),
                    frequency_in_population: frequency(population_count, population_vectors.len()),
                    improvement_delta: numerator as f64 / (k * n) as f64,
                    rank: 0,
                    cohort_count,
                    population_count,
                };
                (numerator, stat)
            })
            .filter(|(numerator, _)| *numerator > 0)
            .collect();

        scored.sort_by(|(a_num, a), (b_num, b)| {
            b_num.cmp(a_num).then_with(|| a.feature_id.cmp(&b.feature_id))
        });
        let mut stats: Vec<FeatureStat> = scored.into_iter().map(|(_, stat)| stat).collect();

        for (i, stat) in stats.iter_mut().enumerate() {
            stat.rank = i + 1;
        }

        if stats.is_empty() {
            warn!("No feature is over-represented in the cohort");
        } else {
            debug!(
                ranked = stats.len(),
                top_feature = %stats[0].feature_id,
                top_delta = stats[0].improvement_delta,
                "Ranked features"
            );
        }

        stats
    }
}

fn count(vectors: &[FeatureVector], feature_id: &str) -> usize {
    vectors.iter().filter(|v| v.has(feature_id)).count()
}

fn frequency(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
