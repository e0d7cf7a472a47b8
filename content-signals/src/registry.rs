//! The canonical feature registry.
//!
//! One fixed table of feature definitions shared by every consumer. The
//! canonical ids are stable across runs; callers may register more features
//! but never replace these.

use tracing::debug;

use crate::feature::{Detector, FeatureCategory, FeatureDefinition};
use crate::settings::SettingKey;
use crate::types::{ContentSource, RegistryError, Result};

/// Version of the canonical feature table.
pub const REGISTRY_VERSION: &str = "1.0.0";

/// Emoji counted by `has_emoji`.
pub const EMOJI_SET: &[&str] = &[
    "😀", "😂", "🤣", "😍", "😱", "😭", "🤔", "👍", "👀", "🙏", "💪", "🔥", "🚀", "📈", "📉",
    "💰", "💸", "💎", "🎯", "✅", "❌", "⚠️", "💡", "🎉",
];

/// Vocabulary counted by `has_technical_analysis`.
pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "技術分析",
    "技術面",
    "均線",
    "K線",
    "KD",
    "MACD",
    "RSI",
    "布林",
    "支撐",
    "壓力",
    "突破",
    "量價",
    "成交量",
    "黃金交叉",
    "死亡交叉",
    "technical analysis",
    "moving average",
    "support level",
    "resistance",
    "breakout",
    "volume",
    "candlestick",
    "bollinger",
];

/// Canonical feature ids.
pub mod ids {
    pub const HAS_QUESTION: &str = "has_question";
    pub const HAS_EMOJI: &str = "has_emoji";
    pub const HAS_HASHTAG: &str = "has_hashtag";
    pub const CONTENT_LENGTH_SHORT: &str = "content_length_short";
    pub const CONTENT_LENGTH_MEDIUM: &str = "content_length_medium";
    pub const CONTENT_LENGTH_LONG: &str = "content_length_long";
    pub const HAS_TECHNICAL_ANALYSIS: &str = "has_technical_analysis";
    pub const MORNING_POSTING: &str = "morning_posting";
    pub const AFTERNOON_POSTING: &str = "afternoon_posting";
    pub const EVENING_POSTING: &str = "evening_posting";
    pub const SYSTEM_SOURCE: &str = "system_source";
    pub const MULTI_TAGS: &str = "multi_tags";
}

/// Ordered collection of feature definitions with unique ids.
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    version: String,
    definitions: Vec<FeatureDefinition>,
}

impl FeatureRegistry {
    /// Create an empty registry.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            definitions: Vec::new(),
        }
    }

    /// The canonical feature set with posting hours read in UTC.
    pub fn standard() -> Self {
        Self::standard_with_offset(0)
    }

    /// The canonical feature set with posting hours read at `utc_offset_secs`.
    pub fn standard_with_offset(utc_offset_secs: i32) -> Self {
        let hours = |start, end| Detector::PostingHour {
            start,
            end,
            utc_offset_secs,
        };

        let definitions = vec![
            FeatureDefinition::new(
                ids::HAS_QUESTION,
                "Contains a question",
                FeatureCategory::Interaction,
                Detector::QuestionMark,
            )
            .modifiable_via(SettingKey::ContentStyle)
            .with_examples(["你覺得呢？", "Is this the bottom?"]),
            FeatureDefinition::new(
                ids::HAS_EMOJI,
                "Contains emoji",
                FeatureCategory::Interaction,
                Detector::Emoji(EMOJI_SET.iter().map(|e| e.to_string()).collect()),
            )
            .modifiable_via(SettingKey::ContentStyle)
            .with_examples(["🚀", "📈", "🔥"]),
            FeatureDefinition::new(
                ids::HAS_HASHTAG,
                "Contains a hashtag",
                FeatureCategory::Interaction,
                Detector::Hashtag,
            )
            .modifiable_via(SettingKey::ContentStyle)
            .with_examples(["#台積電", "#AI"]),
            FeatureDefinition::new(
                ids::CONTENT_LENGTH_SHORT,
                "Short body (< 200 chars)",
                FeatureCategory::Content,
                Detector::BodyLength {
                    min: None,
                    max: Some(199),
                },
            )
            .modifiable_via(SettingKey::ContentLength)
            .with_examples(["short"]),
            FeatureDefinition::new(
                ids::CONTENT_LENGTH_MEDIUM,
                "Medium body (200-500 chars)",
                FeatureCategory::Content,
                Detector::BodyLength {
                    min: Some(200),
                    max: Some(500),
                },
            )
            .modifiable_via(SettingKey::ContentLength)
            .with_examples(["medium"]),
            FeatureDefinition::new(
                ids::CONTENT_LENGTH_LONG,
                "Long body (> 500 chars)",
                FeatureCategory::Content,
                Detector::BodyLength {
                    min: Some(501),
                    max: None,
                },
            )
            .modifiable_via(SettingKey::ContentLength)
            .with_examples(["long"]),
            FeatureDefinition::new(
                ids::HAS_TECHNICAL_ANALYSIS,
                "Technical analysis vocabulary",
                FeatureCategory::Content,
                Detector::keywords(TECHNICAL_KEYWORDS),
            )
            .modifiable_via(SettingKey::ContentStyle)
            .with_examples(["MACD", "均線", "支撐"]),
            FeatureDefinition::new(
                ids::MORNING_POSTING,
                "Posted 06:00-12:00",
                FeatureCategory::Timing,
                hours(6, 12),
            )
            .with_examples(["09:30"]),
            FeatureDefinition::new(
                ids::AFTERNOON_POSTING,
                "Posted 12:00-18:00",
                FeatureCategory::Timing,
                hours(12, 18),
            )
            .with_examples(["14:00"]),
            FeatureDefinition::new(
                ids::EVENING_POSTING,
                "Posted 18:00-24:00",
                FeatureCategory::Timing,
                hours(18, 24),
            )
            .with_examples(["21:00"]),
            FeatureDefinition::new(
                ids::SYSTEM_SOURCE,
                "Generated by the system",
                FeatureCategory::Source,
                Detector::Source(ContentSource::System),
            )
            .modifiable_via(SettingKey::GenerationMode)
            .with_examples(["system"]),
            FeatureDefinition::new(
                ids::MULTI_TAGS,
                "More than one tag",
                FeatureCategory::Structure,
                Detector::TagCount { min: 2 },
            )
            .modifiable_via(SettingKey::MaxStocks)
            .with_examples(["2330, 2454"]),
        ];

        Self {
            version: REGISTRY_VERSION.to_string(),
            definitions,
        }
    }

    /// Add a feature. Fails if the id is already taken.
    pub fn register(&mut self, definition: FeatureDefinition) -> Result<()> {
        if self.contains(&definition.id) {
            return Err(RegistryError::DuplicateFeature(definition.id));
        }
        debug!(feature_id = %definition.id, "Registered feature");
        self.definitions.push(definition);
        Ok(())
    }

    /// Add several features, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = FeatureDefinition>,
    ) -> Result<()> {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(())
    }

    /// Version of this table.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Look a feature up by id.
    pub fn get(&self, id: &str) -> Option<&FeatureDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Check if an id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Feature ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.id.as_str()).collect()
    }

    /// Iterate over definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureDefinition> {
        self.definitions.iter()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Predicate;
    use crate::types::ContentItem;
    use chrono::{TimeZone, Utc};

    fn item() -> ContentItem {
        ContentItem::new("p", "a", Utc.with_ymd_and_hms(2024, 5, 2, 20, 0, 0).unwrap())
    }

    #[test]
    fn test_canonical_ids_present() {
        let registry = FeatureRegistry::standard();
        assert_eq!(
            registry.ids(),
            vec![
                "has_question",
                "has_emoji",
                "has_hashtag",
                "content_length_short",
                "content_length_medium",
                "content_length_long",
                "has_technical_analysis",
                "morning_posting",
                "afternoon_posting",
                "evening_posting",
                "system_source",
                "multi_tags",
            ]
        );
        assert_eq!(registry.version(), REGISTRY_VERSION);
    }

    #[test]
    fn test_length_buckets_are_disjoint() {
        let registry = FeatureRegistry::standard();
        let short = registry.get(ids::CONTENT_LENGTH_SHORT).unwrap();
        let medium = registry.get(ids::CONTENT_LENGTH_MEDIUM).unwrap();
        let long = registry.get(ids::CONTENT_LENGTH_LONG).unwrap();

        for (len, expected) in [(0, 0), (199, 0), (200, 1), (500, 1), (501, 2)] {
            let item = item().with_body("字".repeat(len));
            let hits = [short.detect(&item), medium.detect(&item), long.detect(&item)];
            assert_eq!(hits.iter().filter(|h| **h).count(), 1, "len {}", len);
            assert!(hits[expected], "len {} should land in bucket {}", len, expected);
        }
    }

    #[test]
    fn test_timing_not_modifiable() {
        let registry = FeatureRegistry::standard();
        for feature in registry.iter() {
            if feature.category == FeatureCategory::Timing {
                assert!(!feature.is_modifiable);
                assert!(feature.setting_key.is_none());
            } else {
                assert!(feature.is_modifiable, "{} should be modifiable", feature.id);
            }
        }
    }

    #[test]
    fn test_evening_and_system_source() {
        let registry = FeatureRegistry::standard();
        let item = item().with_source(ContentSource::System);
        assert!(registry.get(ids::EVENING_POSTING).unwrap().detect(&item));
        assert!(!registry.get(ids::MORNING_POSTING).unwrap().detect(&item));
        assert!(registry.get(ids::SYSTEM_SOURCE).unwrap().detect(&item));
    }

    #[test]
    fn test_duplicate_rejected() {
        fn never(_: &ContentItem) -> bool {
            false
        }
        let mut registry = FeatureRegistry::standard();
        let duplicate = FeatureDefinition::new(
            ids::HAS_QUESTION,
            "Shadow",
            FeatureCategory::Interaction,
            Detector::Custom(Predicate(never)),
        );
        assert!(matches!(
            registry.register(duplicate),
            Err(RegistryError::DuplicateFeature(id)) if id == ids::HAS_QUESTION
        ));
        assert_eq!(registry.len(), 12);
    }
}
