//! Settings mapping table: which generation settings each feature implies.
//!
//! The table is a versioned artifact of its own. Every check on it happens
//! when it is loaded, so synthesis never sees a key outside the downstream
//! vocabulary or a value of the wrong shape.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use content_signals::{FeatureRegistry, SettingKey};

/// The table shipped with this crate.
const STANDARD_TABLE: &str = include_str!("settings_mapping.yaml");

/// Settings overrides for one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsMappingRow {
    /// Feature the row applies to
    pub feature_id: String,
    /// Downstream key to value
    pub overrides: BTreeMap<SettingKey, Value>,
}

/// Versioned feature-to-settings lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsMappingTable {
    /// Table version
    pub version: String,
    /// Always-on settings that apply unless a feature overrides them
    #[serde(default)]
    pub defaults: BTreeMap<SettingKey, Value>,
    /// One row per mapped feature
    #[serde(default)]
    pub rows: Vec<SettingsMappingRow>,
}

/// Errors raised while loading a mapping table.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Malformed YAML or a key outside the vocabulary
    #[error("Failed to parse mapping table: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Value shape does not match the key
    #[error("Invalid value for {key} in {context}: expected {expected}")]
    InvalidValue {
        context: String,
        key: SettingKey,
        expected: &'static str,
    },

    /// Two rows for the same feature
    #[error("Duplicate mapping row for feature: {0}")]
    DuplicateRow(String),

    /// Row names a feature the registry does not know
    #[error("Mapping row for unknown feature: {0}")]
    UnknownFeature(String),

    /// Row for a feature that cannot be expressed as a setting
    #[error("Feature is not modifiable: {0}")]
    NotModifiable(String),

    /// Row does not set the key its feature declares
    #[error("Mapping row for {feature_id} does not set its declared key {key}")]
    MissingSettingKey { feature_id: String, key: SettingKey },
}

impl SettingsMappingTable {
    /// The shipped table, checked against the canonical registry.
    pub fn standard() -> Result<Self, MappingError> {
        let table = Self::from_yaml(STANDARD_TABLE)?;
        table.validate_against(&FeatureRegistry::standard())?;
        Ok(table)
    }

    /// Parse and validate a table from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, MappingError> {
        let table: Self = serde_yaml::from_str(yaml)?;
        table.validate()?;
        debug!(
            version = %table.version,
            rows = table.rows.len(),
            "Loaded settings mapping table"
        );
        Ok(table)
    }

    /// Parse and validate a table from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Check value shapes and row uniqueness.
    pub fn validate(&self) -> Result<(), MappingError> {
        check_values("defaults", &self.defaults)?;

        let mut seen = HashSet::new();
        for row in &self.rows {
            if !seen.insert(row.feature_id.as_str()) {
                return Err(MappingError::DuplicateRow(row.feature_id.clone()));
            }
            check_values(&row.feature_id, &row.overrides)?;
        }
        Ok(())
    }

    /// Check that every row maps a known, modifiable feature and sets the
    /// key that feature declares.
    pub fn validate_against(&self, registry: &FeatureRegistry) -> Result<(), MappingError> {
        for row in &self.rows {
            let feature = registry
                .get(&row.feature_id)
                .ok_or_else(|| MappingError::UnknownFeature(row.feature_id.clone()))?;

            if !feature.is_modifiable {
                return Err(MappingError::NotModifiable(row.feature_id.clone()));
            }

            if let Some(key) = feature.setting_key {
                if !row.overrides.contains_key(&key) {
                    return Err(MappingError::MissingSettingKey {
                        feature_id: row.feature_id.clone(),
                        key,
                    });
                }
            }
        }
        Ok(())
    }

    /// Row for a feature.
    pub fn get(&self, feature_id: &str) -> Option<&SettingsMappingRow> {
        self.rows.iter().find(|r| r.feature_id == feature_id)
    }

    /// Whether a feature has a row.
    pub fn contains(&self, feature_id: &str) -> bool {
        self.get(feature_id).is_some()
    }
}

fn check_values(context: &str, values: &BTreeMap<SettingKey, Value>) -> Result<(), MappingError> {
    for (key, value) in values {
        let kind = key.value_kind();
        if !kind.accepts(value) {
            return Err(MappingError::InvalidValue {
                context: context.to_string(),
                key: *key,
                expected: kind.as_str(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_signals::registry::ids;
    use serde_json::json;

    #[test]
    fn test_standard_table_loads() {
        let table = SettingsMappingTable::standard().unwrap();
        assert_eq!(table.defaults[&SettingKey::EnableNewsLinks], json!(true));
        assert_eq!(table.defaults[&SettingKey::NewsMaxLinks], json!(5));

        // Every modifiable canonical feature is mapped, timing features are not
        let registry = FeatureRegistry::standard();
        for feature in registry.iter() {
            assert_eq!(table.contains(&feature.id), feature.is_modifiable, "{}", feature.id);
        }
    }

    #[test]
    fn test_unknown_key_rejected_at_load() {
        let yaml = r#"
version: "test"
rows:
  - feature_id: has_question
    overrides:
      font_color: red
"#;
        assert!(matches!(
            SettingsMappingTable::from_yaml(yaml),
            Err(MappingError::Parse(_))
        ));
    }

    #[test]
    fn test_wrong_value_kind_rejected() {
        let yaml = r#"
version: "test"
defaults:
  enable_news_links: "yes"
"#;
        assert!(matches!(
            SettingsMappingTable::from_yaml(yaml),
            Err(MappingError::InvalidValue { key: SettingKey::EnableNewsLinks, .. })
        ));
    }

    #[test]
    fn test_duplicate_row_rejected() {
        let yaml = r#"
version: "test"
rows:
  - feature_id: has_emoji
    overrides: {content_style: casual}
  - feature_id: has_emoji
    overrides: {content_style: playful}
"#;
        assert!(matches!(
            SettingsMappingTable::from_yaml(yaml),
            Err(MappingError::DuplicateRow(id)) if id == ids::HAS_EMOJI
        ));
    }

    #[test]
    fn test_registry_checks() {
        let registry = FeatureRegistry::standard();

        let timing = SettingsMappingTable::from_yaml(
            "version: t\nrows:\n  - feature_id: morning_posting\n    overrides: {trigger_type: morning}\n",
        )
        .unwrap();
        assert!(matches!(
            timing.validate_against(&registry),
            Err(MappingError::NotModifiable(_))
        ));

        let unknown = SettingsMappingTable::from_yaml(
            "version: t\nrows:\n  - feature_id: has_video\n    overrides: {include_charts: true}\n",
        )
        .unwrap();
        assert!(matches!(
            unknown.validate_against(&registry),
            Err(MappingError::UnknownFeature(_))
        ));

        let missing = SettingsMappingTable::from_yaml(
            "version: t\nrows:\n  - feature_id: multi_tags\n    overrides: {stock_sorting: volume_desc}\n",
        )
        .unwrap();
        assert!(matches!(
            missing.validate_against(&registry),
            Err(MappingError::MissingSettingKey { key: SettingKey::MaxStocks, .. })
        ));
    }
}
