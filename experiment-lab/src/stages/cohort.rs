//! Cohort selector - splits a corpus into top performers and population.

use tracing::debug;

use content_signals::ContentItem;

use crate::types::{CohortResult, CohortSummary, InvalidInputError};

/// Selects the top-quantile cohort by engagement score.
#[derive(Debug, Clone, Copy, Default)]
pub struct CohortSelector;

impl CohortSelector {
    /// Create a new selector.
    pub fn new() -> Self {
        Self
    }

    /// Partition `corpus` into a cohort of the top `max(1, floor(n * quantile))`
    /// items and the full population.
    ///
    /// Items with equal scores keep their corpus order.
    pub fn select<'a>(
        &self,
        corpus: &'a [ContentItem],
        quantile: f64,
    ) -> Result<CohortResult<'a>, InvalidInputError> {
        if corpus.is_empty() {
            return Err(InvalidInputError::EmptyCorpus);
        }
        if !(quantile > 0.0 && quantile <= 1.0) {
            return Err(InvalidInputError::InvalidQuantile(quantile));
        }

        let mut population: Vec<&ContentItem> = corpus.iter().collect();
        // sort_by is stable, so ties stay in corpus order
        population.sort_by(|a, b| b.engagement_score().cmp(&a.engagement_score()));

        let cohort_size = cohort_size(population.len(), quantile);
        let cohort = population[..cohort_size].to_vec();

        let summary = CohortSummary {
            quantile,
            cohort_size,
            population_size: population.len(),
            score_threshold: cohort.last().map(|i| i.engagement_score()).unwrap_or(0),
            cohort_mean_score: mean_score(&cohort),
            population_mean_score: mean_score(&population),
        };

        debug!(
            cohort_size,
            population_size = population.len(),
            score_threshold = summary.score_threshold,
            "Selected cohort"
        );

        Ok(CohortResult {
            cohort,
            population,
            quantile,
            summary,
        })
    }
}

/// `max(1, floor(n * quantile))`, never more than `n`.
pub fn cohort_size(n: usize, quantile: f64) -> usize {
    ((n as f64 * quantile).floor() as usize).clamp(1, n.max(1))
}

fn mean_score(items: &[&ContentItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let total: f64 = items.iter().map(|i| i.engagement_score() as f64).sum();
    total / items.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use content_signals::Engagement;

    fn item(id: &str, likes: u64) -> ContentItem {
        ContentItem::new(id, "author", Utc::now()).with_engagement(Engagement {
            likes,
            ..Default::default()
        })
    }

    fn ids(items: &[&ContentItem]) -> Vec<String> {
        items.iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_cohort_size_formula() {
        assert_eq!(cohort_size(10, 0.2), 2);
        assert_eq!(cohort_size(10, 0.01), 1);
        assert_eq!(cohort_size(1, 0.5), 1);
        assert_eq!(cohort_size(7, 1.0), 7);
        assert_eq!(cohort_size(9, 0.5), 4);
    }

    #[test]
    fn test_selects_top_by_score() {
        let corpus = vec![item("a", 1), item("b", 50), item("c", 7), item("d", 30), item("e", 0)];
        let result = CohortSelector::new().select(&corpus, 0.4).unwrap();

        assert_eq!(ids(&result.cohort), vec!["b", "d"]);
        assert_eq!(ids(&result.population), vec!["b", "d", "c", "a", "e"]);
        assert_eq!(result.summary.score_threshold, 30);
        assert_eq!(result.summary.cohort_mean_score, 40.0);
        assert_eq!(result.summary.population_mean_score, 17.6);
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let corpus = vec![item("z", 0), item("y", 5), item("x", 0), item("w", 5)];
        let result = CohortSelector::new().select(&corpus, 0.75).unwrap();
        assert_eq!(ids(&result.cohort), vec!["y", "w", "z"]);
        assert_eq!(ids(&result.population), vec!["y", "w", "z", "x"]);
    }

    #[test]
    fn test_single_item_corpus() {
        let corpus = vec![item("only", 3)];
        let result = CohortSelector::new().select(&corpus, 0.1).unwrap();
        assert_eq!(result.cohort.len(), 1);
        assert_eq!(ids(&result.cohort), ids(&result.population));
    }

    #[test]
    fn test_rejects_invalid_input() {
        let selector = CohortSelector::new();
        assert_eq!(
            selector.select(&[], 0.2).unwrap_err(),
            InvalidInputError::EmptyCorpus
        );

        let corpus = vec![item("a", 1)];
        for q in [0.0, -0.5, 1.01, f64::NAN] {
            assert!(matches!(
                selector.select(&corpus, q),
                Err(InvalidInputError::InvalidQuantile(_))
            ));
        }
    }
}
