use std::path::PathBuf;

use clap::Parser;
use edcat::Library;
use serde::Serialize;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Default, Parser)]
#[command(about = "Validate every record, cross-reference and manifest entry")]
pub struct Validate {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
    Summary,
}

#[derive(Debug, Default, Serialize)]
struct ValidationResult {
    /// The failed load stage, if any.
    stage: Option<&'static str>,
    errors: Vec<String>,
    warnings: Vec<String>,
    topics: usize,
    categories: usize,
}

impl ValidationResult {
    const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Validate {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let result = match Library::new(root).load() {
            Ok(library) => ValidationResult {
                stage: None,
                errors: Vec::new(),
                warnings: library.warnings().iter().map(ToString::to_string).collect(),
                topics: library.store().len(),
                categories: library.registry().categories().len(),
            },
            Err(error) => ValidationResult {
                stage: Some(error.summary()),
                errors: error.problems(),
                ..ValidationResult::default()
            },
        };

        match self.output {
            OutputFormat::Table => self.output_table(&result),
            OutputFormat::Json => self.output_json(&result)?,
            OutputFormat::Summary => Self::output_summary(&result),
        }

        // Exit with appropriate code
        if !result.is_valid() {
            std::process::exit(2);
        }

        Ok(())
    }

    fn output_table(&self, result: &ValidationResult) {
        if let Some(stage) = result.stage {
            eprintln!(
                "{}",
                format!("✗ {stage}: {} problems found", result.errors.len()).error()
            );
            for error in &result.errors {
                eprintln!("  • {error}");
            }
            return;
        }

        if self.quiet {
            return;
        }

        println!(
            "✓ Records:    {} topics, all valid",
            result.topics
        );
        println!("✓ Manifest:   {} categories registered", result.categories);

        if result.warnings.is_empty() {
            println!("✓ Links:      All cross-references resolve");
            println!("\n{}", "Catalog is healthy (0 issues)".success());
        } else {
            println!(
                "{}",
                format!("! Warnings:   {} found", result.warnings.len()).warning()
            );
            for warning in &result.warnings {
                println!("  • {}", warning.dim());
            }
            println!(
                "\n{}",
                format!(
                    "Catalog is valid with {} warnings",
                    result.warnings.len()
                )
                .warning()
            );
        }
    }

    fn output_json(&self, result: &ValidationResult) -> anyhow::Result<()> {
        if self.quiet && result.is_valid() {
            return Ok(());
        }

        let output = serde_json::json!({
            "status": if result.is_valid() { "valid" } else { "invalid" },
            "result": result,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_summary(result: &ValidationResult) {
        println!(
            "errors={} warnings={}",
            result.errors.len(),
            result.warnings.len()
        );
    }
}
