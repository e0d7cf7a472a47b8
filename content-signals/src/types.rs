//! Core types for published content and its engagement telemetry.
//!
//! Items are supplied wholesale by an input collaborator at the start of a run
//! and are never mutated afterwards.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for the consumers on the other side of the boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// One published piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Unique identifier
    pub id: String,
    /// Title text (null is read as empty)
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    /// Body text (null is read as empty)
    #[serde(default, deserialize_with = "nullable_string")]
    pub body: String,
    /// Author identifier
    pub author_id: String,
    /// When the item was published
    pub created_at: DateTime<Utc>,
    /// Engagement counters
    #[serde(default)]
    pub engagement: Engagement,
    /// Ordered tags attached to the item
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Associated discussion topic
    #[serde(default)]
    pub topic: Option<String>,
    /// Where the item came from
    #[serde(default)]
    pub source: ContentSource,
}

impl ContentItem {
    /// Create an item with empty text and zero engagement.
    pub fn new(id: impl Into<String>, author_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            body: String::new(),
            author_id: author_id.into(),
            created_at,
            engagement: Engagement::default(),
            tags: Vec::new(),
            topic: None,
            source: ContentSource::default(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the engagement counters.
    pub fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = engagement;
        self
    }

    /// Append a tag.
    pub fn with_tag(mut self, tag_type: impl Into<String>, key: impl Into<String>) -> Self {
        self.tags.push(Tag {
            tag_type: tag_type.into(),
            key: key.into(),
        });
        self
    }

    /// Set the discussion topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the provenance.
    pub fn with_source(mut self, source: ContentSource) -> Self {
        self.source = source;
        self
    }

    /// Composite engagement score of this item.
    pub fn engagement_score(&self) -> u64 {
        self.engagement.score()
    }
}

/// Audience engagement counters. Unsigned, so never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(default)]
pub struct Engagement {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
    pub bookmarks: u64,
    pub donations: u64,
}

impl Engagement {
    /// Sum of every counter.
    pub fn score(&self) -> u64 {
        [
            self.likes,
            self.comments,
            self.shares,
            self.views,
            self.bookmarks,
            self.donations,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/// A typed tag, e.g. `{type: "stock", key: "2330"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Tag {
    /// Tag namespace
    #[serde(rename = "type")]
    pub tag_type: String,
    /// Tag value within the namespace
    pub key: String,
}

/// Provenance of a content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Written by hand inside the platform
    #[default]
    Manual,
    /// Imported from an external platform
    External,
    /// Produced by the automated generation pipeline
    System,
}

impl ContentSource {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::External => "external",
            Self::System => "system",
        }
    }
}

fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Error types for content signals.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A feature with this id is already registered
    #[error("Duplicate feature id: {0}")]
    DuplicateFeature(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
