//! Command-line arguments and input loading.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use content_signals::ContentItem;
use experiment_lab::{LabConfig, SynthesisMode};

#[derive(Parser, Debug)]
#[command(name = "labctl")]
#[command(about = "Rank content features by engagement lift and synthesize generation experiments")]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true, env = "LABCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(long, global = true, env = "LABCTL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Hour offset from UTC used for posting-time features (overrides config file)
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub utc_offset: Option<i32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the feature registry
    Features,

    /// Rank features for a corpus
    Analyze {
        #[command(flatten)]
        input: CorpusArgs,
    },

    /// Rank features and synthesize experiments
    Synthesize {
        #[command(flatten)]
        input: CorpusArgs,

        /// Settings mapping table (YAML); defaults to the shipped table
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// One experiment per feature, or all features folded into one
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Comma-separated feature ids, applied in order; skips ranking-based selection
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,

        /// Number of ranked features to use when --features is not given
        #[arg(long)]
        top_n: Option<usize>,
    },
}

#[derive(clap::Args, Debug)]
pub struct CorpusArgs {
    /// Corpus file: JSON array of content items, or YAML with a .yaml/.yml extension
    #[arg(long)]
    pub corpus: PathBuf,

    /// Share of the corpus treated as top performers (overrides config file)
    #[arg(short, long)]
    pub quantile: Option<f64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Single,
    Combined,
}

impl From<ModeArg> for SynthesisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => SynthesisMode::Single,
            ModeArg::Combined => SynthesisMode::Combined,
        }
    }
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn resolve_config(&self) -> anyhow::Result<LabConfig> {
        let mut config = match &self.config {
            Some(path) => LabConfig::from_file(path)?,
            None => LabConfig::default(),
        };

        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(offset) = self.utc_offset {
            config.features.utc_offset_hours = offset;
        }

        match &self.command {
            Command::Features => {}
            Command::Analyze { input } => apply_corpus_args(&mut config, input),
            Command::Synthesize {
                input,
                mode,
                features,
                top_n,
                ..
            } => {
                apply_corpus_args(&mut config, input);
                if let Some(mode) = mode {
                    config.synthesis.mode = (*mode).into();
                }
                if !features.is_empty() {
                    config.synthesis.feature_ids = features.clone();
                }
                if let Some(n) = top_n {
                    config.synthesis.top_n = *n;
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn apply_corpus_args(config: &mut LabConfig, input: &CorpusArgs) {
    if let Some(q) = input.quantile {
        config.cohort.quantile = q;
    }
}

/// Read a corpus file.
pub fn load_corpus(path: &Path) -> anyhow::Result<Vec<ContentItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading corpus {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let corpus = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("parsing corpus {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("parsing corpus {}", path.display()))?
    };
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CORPUS_JSON: &str = r#"[
        {"id": "1", "title": "Up?", "body": null, "authorId": "a", "createdAt": "2024-01-02T03:04:05Z",
         "engagement": {"likes": 3, "views": 100}, "tags": [{"type": "stock", "key": "2330"}]},
        {"id": "2", "title": "Down", "authorId": "b", "createdAt": "2024-01-02T05:00:00+08:00",
         "source": "system"}
    ]"#;

    fn write(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_json_corpus() {
        let file = write(".json", CORPUS_JSON);
        let corpus = load_corpus(file.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].engagement_score(), 103);
        assert_eq!(corpus[1].source, content_signals::ContentSource::System);
    }

    #[test]
    fn test_load_yaml_corpus() {
        let yaml = r#"
- id: "1"
  title: "Up?"
  authorId: a
  createdAt: "2024-01-02T03:04:05Z"
  engagement:
    shares: 2
"#;
        let file = write(".yaml", yaml);
        let corpus = load_corpus(file.path()).unwrap();
        assert_eq!(corpus[0].engagement_score(), 2);
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = write(
            ".yaml",
            "cohort:\n  quantile: 0.1\nsynthesis:\n  mode: combined\n  top_n: 5\n",
        );
        let cli = Cli::parse_from([
            "labctl",
            "--config",
            file.path().to_str().unwrap(),
            "--utc-offset",
            "-5",
            "synthesize",
            "--corpus",
            "corpus.json",
            "--quantile",
            "0.3",
            "--features",
            "has_question,multi_tags",
        ]);

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.cohort.quantile, 0.3);
        assert_eq!(config.synthesis.mode, SynthesisMode::Combined);
        assert_eq!(config.synthesis.top_n, 5);
        assert_eq!(config.synthesis.feature_ids, vec!["has_question", "multi_tags"]);
        assert_eq!(config.features.utc_offset_hours, -5);
    }

    #[test]
    fn test_invalid_quantile_flag_rejected() {
        let cli = Cli::parse_from(["labctl", "analyze", "--corpus", "c.json", "-q", "1.5"]);
        assert!(cli.resolve_config().is_err());
    }
}
