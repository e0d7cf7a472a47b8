//! Feature extractor - applies every registry detector to every item.

use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use content_signals::{ContentItem, FeatureRegistry};

use crate::types::{FeatureVector, LabError, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Shared flag for cooperative cancellation of long extraction runs.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Computes one [`FeatureVector`] per item.
#[derive(Debug, Clone)]
pub struct FeatureExtractor<'r> {
    registry: &'r FeatureRegistry,
}

impl<'r> FeatureExtractor<'r> {
    /// Create an extractor over a registry.
    pub fn new(registry: &'r FeatureRegistry) -> Self {
        Self { registry }
    }

    /// Vector for a single item.
    pub fn extract_one(&self, item: &ContentItem) -> FeatureVector {
        FeatureVector {
            item_id: item.id.clone(),
            values: self
                .registry
                .iter()
                .map(|feature| (feature.id.clone(), feature.detect(item)))
                .collect(),
        }
    }

    /// Vectors for every item, in input order.
    #[cfg(not(feature = "parallel"))]
    pub fn extract<T>(&self, items: &[T]) -> Vec<FeatureVector>
    where
        T: Borrow<ContentItem>,
    {
        let vectors: Vec<FeatureVector> = items
            .iter()
            .map(|item| self.extract_one(item.borrow()))
            .collect();
        debug!(items = vectors.len(), features = self.registry.len(), "Extracted features");
        vectors
    }

    /// Vectors for every item, in input order.
    #[cfg(feature = "parallel")]
    pub fn extract<T>(&self, items: &[T]) -> Vec<FeatureVector>
    where
        T: Borrow<ContentItem> + Sync,
    {
        let vectors: Vec<FeatureVector> = items
            .par_iter()
            .map(|item| self.extract_one(item.borrow()))
            .collect();
        debug!(items = vectors.len(), features = self.registry.len(), "Extracted features");
        vectors
    }

    /// Like [`extract`](Self::extract), but checks `cancel` before each item.
    ///
    /// A cancelled run returns [`LabError::Cancelled`] and no vectors.
    pub fn extract_cancellable<T>(
        &self,
        items: &[T],
        cancel: &CancellationFlag,
    ) -> Result<Vec<FeatureVector>>
    where
        T: Borrow<ContentItem>,
    {
        let mut vectors = Vec::with_capacity(items.len());
        for item in items {
            if cancel.is_cancelled() {
                debug!(processed = vectors.len(), "Extraction cancelled");
                return Err(LabError::Cancelled);
            }
            vectors.push(self.extract_one(item.borrow()));
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use content_signals::registry::ids;

    fn corpus() -> Vec<ContentItem> {
        let at = Utc.with_ymd_and_hms(2024, 1, 8, 8, 0, 0).unwrap();
        vec![
            ContentItem::new("q", "a", at).with_title("Is 2330 a buy?"),
            ContentItem::new("t", "a", at)
                .with_body("MACD golden cross")
                .with_tag("stock", "2330")
                .with_tag("stock", "2454"),
            ContentItem::new("empty", "a", at),
        ]
    }

    #[test]
    fn test_one_vector_per_item_in_order() {
        let registry = FeatureRegistry::standard();
        let items = corpus();
        let vectors = FeatureExtractor::new(&registry).extract(&items);

        assert_eq!(vectors.len(), 3);
        assert_eq!(vectors[0].item_id, "q");
        assert_eq!(vectors[2].item_id, "empty");
        for vector in &vectors {
            assert_eq!(vector.values.len(), registry.len());
        }

        assert!(vectors[0].has(ids::HAS_QUESTION));
        assert!(vectors[1].has(ids::HAS_TECHNICAL_ANALYSIS));
        assert!(vectors[1].has(ids::MULTI_TAGS));
        assert!(vectors[2].has(ids::CONTENT_LENGTH_SHORT));
        assert!(vectors[2].has(ids::MORNING_POSTING));
        assert!(!vectors[2].has(ids::HAS_QUESTION));
    }

    #[test]
    fn test_accepts_borrowed_items() {
        let registry = FeatureRegistry::standard();
        let items = corpus();
        let refs: Vec<&ContentItem> = items.iter().collect();
        let extractor = FeatureExtractor::new(&registry);
        assert_eq!(extractor.extract(&refs), extractor.extract(&items));
    }

    #[test]
    fn test_cancellation() {
        let registry = FeatureRegistry::standard();
        let items = corpus();
        let extractor = FeatureExtractor::new(&registry);
        let cancel = CancellationFlag::new();

        assert_eq!(extractor.extract_cancellable(&items, &cancel).unwrap().len(), 3);

        cancel.clone().cancel();
        assert!(matches!(
            extractor.extract_cancellable(&items, &cancel),
            Err(LabError::Cancelled)
        ));
    }
}
