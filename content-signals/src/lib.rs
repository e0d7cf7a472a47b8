//! Content signals: the item model and feature vocabulary
//!
//! This crate is the leaf of the analysis workspace:
//!
//! - **ContentItem**: a published item plus its engagement counters
//! - **FeatureRegistry**: the canonical table of boolean feature detectors
//! - **SettingKey**: the fixed downstream generation-settings vocabulary
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use content_signals::{ContentItem, FeatureRegistry};
//!
//! let registry = FeatureRegistry::standard();
//! let item = ContentItem::new("post-1", "author-1", Utc::now()).with_title("Buy the dip?");
//!
//! let question = registry.get("has_question").unwrap();
//! assert!(question.detect(&item));
//! ```

pub mod feature;
pub mod registry;
pub mod settings;
pub mod types;

// Re-export main types
pub use feature::{Detector, FeatureCategory, FeatureDefinition, Predicate};
pub use registry::{FeatureRegistry, REGISTRY_VERSION};
pub use settings::{SettingKey, ValueKind};
pub use types::*;
