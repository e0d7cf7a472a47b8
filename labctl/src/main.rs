//! labctl - run feature-frequency analysis over a content corpus
//!
//! Reads a corpus file, ranks which features are over-represented among top
//! performers and prints the result (and synthesized experiments) as JSON on
//! stdout. Logs go to stderr.

mod cli;

use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use content_signals::FeatureRegistry;
use experiment_lab::{AnalysisPipeline, LabConfig, SettingsMappingTable};

use cli::{load_corpus, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "labctl={level},experiment_lab={level},content_signals={level}",
                    level = config.general.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match &cli.command {
        Command::Features => list_features(&config),
        Command::Analyze { input } => {
            let corpus = load_corpus(&input.corpus)?;
            info!("Loaded {} items from {}", corpus.len(), input.corpus.display());

            let pipeline = AnalysisPipeline::new(config)?;
            print_json(&pipeline.analyze(&corpus)?)
        }
        Command::Synthesize { input, mapping, .. } => {
            let corpus = load_corpus(&input.corpus)?;
            info!("Loaded {} items from {}", corpus.len(), input.corpus.display());

            let registry =
                FeatureRegistry::standard_with_offset(config.features.utc_offset_secs());
            let mapping = match mapping {
                Some(path) => {
                    info!("Mapping table: {}", path.display());
                    SettingsMappingTable::from_file(path)?
                }
                None => SettingsMappingTable::standard()?,
            };

            let pipeline = AnalysisPipeline::with_components(registry, mapping, config)?;
            print_json(&pipeline.run(&corpus)?)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeatureRow<'a> {
    id: &'a str,
    display_name: &'a str,
    category: &'a str,
    is_modifiable: bool,
    setting_key: Option<&'a str>,
    example_values: &'a [String],
}

fn list_features(config: &LabConfig) -> anyhow::Result<()> {
    let registry = FeatureRegistry::standard_with_offset(config.features.utc_offset_secs());
    let rows: Vec<FeatureRow> = registry
        .iter()
        .map(|f| FeatureRow {
            id: &f.id,
            display_name: &f.display_name,
            category: f.category.as_str(),
            is_modifiable: f.is_modifiable,
            setting_key: f.setting_key.map(|k| k.as_str()),
            example_values: &f.example_values,
        })
        .collect();

    info!("Feature registry version {}", registry.version());
    print_json(&rows)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
