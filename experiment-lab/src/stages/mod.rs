//! Analysis stages.
//!
//! Each stage is a pure function of its inputs and hands a fully-formed
//! structure to the next:
//!
//! 1. **Cohort**: splits the corpus into top performers and population
//! 2. **Extractor**: computes a feature vector per item
//! 3. **Analyzer**: ranks features by cohort-vs-population frequency delta
//! 4. **Synthesizer**: maps ranked features onto generation settings

mod analyzer;
mod cohort;
mod extractor;
mod synthesizer;

pub use analyzer::FrequencyDifferentialAnalyzer;
pub use cohort::{cohort_size, CohortSelector};
pub use extractor::{CancellationFlag, FeatureExtractor};
pub use synthesizer::{confidence_level, expected_performance, select_top, ExperimentSynthesizer};
