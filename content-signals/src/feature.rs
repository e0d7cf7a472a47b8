//! Feature definitions and their detectors.
//!
//! A detector is a total, pure predicate over a [`ContentItem`]. Missing text
//! simply reads as "feature absent".

use chrono::{FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::SettingKey;
use crate::types::{ContentItem, ContentSource};

/// Broad grouping of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    /// What the text says and how long it is
    Content,
    /// When the item was published
    Timing,
    /// Tags and attachments
    Structure,
    /// Hooks inviting the audience to respond
    Interaction,
    /// Provenance
    Source,
}

impl FeatureCategory {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Timing => "timing",
            Self::Structure => "structure",
            Self::Interaction => "interaction",
            Self::Source => "source",
        }
    }
}

/// Detection strategy for a feature.
#[derive(Debug, Clone)]
pub enum Detector {
    /// Title or body contains `?` or the full-width `？`
    QuestionMark,
    /// Title or body contains any of the given emoji
    Emoji(Vec<String>),
    /// Title or body contains `#` or the full-width `＃`
    Hashtag,
    /// Body length in characters within `[min, max]` (either bound optional)
    BodyLength {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Title or body, Unicode-lowercased, contains any keyword. Keywords must
    /// already be lowercase; build with [`Detector::keywords`].
    Keywords(Vec<String>),
    /// Publication hour in `[start, end)` at the given UTC offset
    PostingHour {
        start: u32,
        end: u32,
        utc_offset_secs: i32,
    },
    /// Item has the given provenance
    Source(ContentSource),
    /// Item has at least `min` tags
    TagCount { min: usize },
    /// Caller-supplied predicate
    Custom(Predicate),
}

/// A plain function detector for registry extensions.
#[derive(Clone, Copy)]
pub struct Predicate(pub fn(&ContentItem) -> bool);

impl std::fmt::Debug for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl Detector {
    /// Keyword detector, lowercasing each keyword once.
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Keywords(keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect())
    }

    /// Evaluate this detector against an item.
    pub fn detect(&self, item: &ContentItem) -> bool {
        match self {
            Self::QuestionMark => any_text_contains(item, &["?", "？"]),
            Self::Emoji(set) => set.iter().any(|e| any_text_contains(item, &[e.as_str()])),
            Self::Hashtag => any_text_contains(item, &["#", "＃"]),
            Self::BodyLength { min, max } => {
                let len = item.body.chars().count();
                min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m)
            }
            Self::Keywords(keywords) => {
                let title = item.title.to_lowercase();
                let body = item.body.to_lowercase();
                keywords
                    .iter()
                    .any(|k| !k.is_empty() && (title.contains(k.as_str()) || body.contains(k.as_str())))
            }
            Self::PostingHour {
                start,
                end,
                utc_offset_secs,
            } => {
                let offset = FixedOffset::east_opt(*utc_offset_secs).unwrap_or_else(|| Utc.fix());
                let hour = item.created_at.with_timezone(&offset).hour();
                hour >= *start && hour < *end
            }
            Self::Source(source) => item.source == *source,
            Self::TagCount { min } => item.tags.len() >= *min,
            Self::Custom(predicate) => (predicate.0)(item),
        }
    }
}

fn any_text_contains(item: &ContentItem, needles: &[&str]) -> bool {
    needles
        .iter()
        .any(|n| !n.is_empty() && (item.title.contains(n) || item.body.contains(n)))
}

/// A named, stable feature and how to detect it.
#[derive(Debug, Clone)]
pub struct FeatureDefinition {
    /// Stable id, unique within a registry
    pub id: String,
    /// Human-readable name
    pub display_name: String,
    /// Grouping
    pub category: FeatureCategory,
    /// Detection strategy
    pub detector: Detector,
    /// Whether this feature can be expressed as a generation setting
    pub is_modifiable: bool,
    /// Downstream key this feature drives, if modifiable
    pub setting_key: Option<SettingKey>,
    /// Illustrative literals, documentation only
    pub example_values: Vec<String>,
}

impl FeatureDefinition {
    /// Create a non-modifiable feature.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        category: FeatureCategory,
        detector: Detector,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category,
            detector,
            is_modifiable: false,
            setting_key: None,
            example_values: Vec::new(),
        }
    }

    /// Mark as modifiable through the given downstream key.
    pub fn modifiable_via(mut self, key: SettingKey) -> Self {
        self.is_modifiable = true;
        self.setting_key = Some(key);
        self
    }

    /// Attach example values.
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.example_values = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Run the detector.
    pub fn detect(&self, item: &ContentItem) -> bool {
        self.detector.detect(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item_at(hour: u32) -> ContentItem {
        ContentItem::new("p", "a", Utc.with_ymd_and_hms(2024, 5, 2, hour, 15, 0).unwrap())
    }

    #[test]
    fn test_question_mark_either_script() {
        let ascii = item_at(9).with_title("Will it break out?");
        let full_width = item_at(9).with_body("明天會漲嗎？");
        let plain = item_at(9).with_title("Breakout confirmed");

        assert!(Detector::QuestionMark.detect(&ascii));
        assert!(Detector::QuestionMark.detect(&full_width));
        assert!(!Detector::QuestionMark.detect(&plain));
    }

    #[test]
    fn test_body_length_counts_characters() {
        let detector = Detector::BodyLength { min: None, max: Some(3) };
        // Three CJK characters are nine bytes
        assert!(detector.detect(&item_at(9).with_body("台積電")));
        assert!(!detector.detect(&item_at(9).with_body("台積電漲")));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let detector = Detector::keywords(["MACD"]);
        assert!(matches!(&detector, Detector::Keywords(k) if k == &["macd"]));
        assert!(detector.detect(&item_at(9).with_body("the macd crossed")));
        assert!(detector.detect(&item_at(9).with_title("MACD golden cross")));
        assert!(!detector.detect(&item_at(9)));
    }

    #[test]
    fn test_posting_hour_with_offset() {
        let morning_taipei = Detector::PostingHour {
            start: 6,
            end: 12,
            utc_offset_secs: 8 * 3600,
        };
        // 02:15 UTC is 10:15 at UTC+8
        assert!(morning_taipei.detect(&item_at(2)));
        assert!(!morning_taipei.detect(&item_at(9)));
    }

    #[test]
    fn test_empty_item_is_feature_absent() {
        let empty = item_at(0);
        assert!(!Detector::QuestionMark.detect(&empty));
        assert!(!Detector::Hashtag.detect(&empty));
        assert!(!Detector::Emoji(vec!["🚀".to_string()]).detect(&empty));
        assert!(!Detector::keywords([""]).detect(&empty));
        assert!(!Detector::TagCount { min: 2 }.detect(&empty));
    }

    #[test]
    fn test_custom_detector() {
        fn has_topic(item: &ContentItem) -> bool {
            item.topic.is_some()
        }
        let feature = FeatureDefinition::new(
            "has_topic",
            "Linked to a topic",
            FeatureCategory::Structure,
            Detector::Custom(Predicate(has_topic)),
        );
        assert!(feature.detect(&item_at(9).with_topic("topic-1")));
        assert!(!feature.detect(&item_at(9)));
        assert!(!feature.is_modifiable);
    }
}
