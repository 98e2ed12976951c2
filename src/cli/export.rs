use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use edcat::Topic;
use tracing::instrument;

#[derive(Debug, Parser)]
#[command(about = "Export every categorised topic under its symbolic name")]
pub struct Export {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl Export {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let library = super::load(root)?;
        let exports = library
            .registry()
            .export_all()
            .context("Cannot build the export namespace")?;

        let exports: BTreeMap<&str, &Topic> = exports
            .iter()
            .map(|(name, topic)| (name.as_str(), &**topic))
            .collect();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&exports)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&exports)?),
        }

        tracing::info!("Exported {} topics", exports.len());
        Ok(())
    }
}
