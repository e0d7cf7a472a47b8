//! Downstream generation-settings vocabulary.
//!
//! The scheduling collaborator accepts exactly these keys. Anything that
//! produces settings goes through [`SettingKey`], so an unknown key cannot be
//! represented at all.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// A key in the downstream configuration vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    TriggerType,
    PostingType,
    MaxStocks,
    StockSorting,
    ContentLength,
    MaxWords,
    ContentStyle,
    EnableNewsLinks,
    NewsMaxLinks,
    KolAssignment,
    GenerationMode,
    IncludeRiskWarning,
    IncludeCharts,
}

/// Shape of the value a key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `true` / `false`
    Flag,
    /// Non-negative integer
    Count,
    /// Free-form string
    Text,
}

impl ValueKind {
    /// Check a value against this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Flag => value.is_boolean(),
            Self::Count => value.is_u64(),
            Self::Text => value.is_string(),
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "boolean",
            Self::Count => "non-negative integer",
            Self::Text => "string",
        }
    }
}

impl SettingKey {
    /// Every key, in vocabulary order.
    pub const ALL: [SettingKey; 13] = [
        Self::TriggerType,
        Self::PostingType,
        Self::MaxStocks,
        Self::StockSorting,
        Self::ContentLength,
        Self::MaxWords,
        Self::ContentStyle,
        Self::EnableNewsLinks,
        Self::NewsMaxLinks,
        Self::KolAssignment,
        Self::GenerationMode,
        Self::IncludeRiskWarning,
        Self::IncludeCharts,
    ];

    /// Wire name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TriggerType => "trigger_type",
            Self::PostingType => "posting_type",
            Self::MaxStocks => "max_stocks",
            Self::StockSorting => "stock_sorting",
            Self::ContentLength => "content_length",
            Self::MaxWords => "max_words",
            Self::ContentStyle => "content_style",
            Self::EnableNewsLinks => "enable_news_links",
            Self::NewsMaxLinks => "news_max_links",
            Self::KolAssignment => "kol_assignment",
            Self::GenerationMode => "generation_mode",
            Self::IncludeRiskWarning => "include_risk_warning",
            Self::IncludeCharts => "include_charts",
        }
    }

    /// Look a key up by wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    /// Value shape this key accepts.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::EnableNewsLinks | Self::IncludeRiskWarning | Self::IncludeCharts => {
                ValueKind::Flag
            }
            Self::MaxStocks | Self::MaxWords | Self::NewsMaxLinks => ValueKind::Count,
            Self::TriggerType
            | Self::PostingType
            | Self::StockSorting
            | Self::ContentLength
            | Self::ContentStyle
            | Self::KolAssignment
            | Self::GenerationMode => ValueKind::Text,
        }
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
