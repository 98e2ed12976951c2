use std::path::PathBuf;

use clap::Parser;
use edcat::{ContentLevel, Level, Topic};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Display a topic record")]
pub struct Show {
    /// The id of the topic to display
    id: String,

    /// Only display this level (1-5)
    #[arg(long, value_parser = parse_level)]
    level: Option<Level>,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Yaml,
}

fn parse_level(s: &str) -> Result<Level, String> {
    let n: u8 = s.parse().map_err(|e| format!("{e}"))?;
    Level::new(n).map_err(|e| e.to_string())
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let library = super::load(root)?;
        let store = library.store();
        let topic = store.get(&self.id)?;

        match (self.output, self.level) {
            (OutputFormat::Pretty, level) => {
                let referrers: Vec<_> = store
                    .referrers(&self.id)
                    .into_iter()
                    .map(|t| t.id().to_string())
                    .collect();
                output_pretty(topic, level, &referrers);
            }
            (OutputFormat::Json, None) => println!("{}", serde_json::to_string_pretty(&**topic)?),
            (OutputFormat::Json, Some(level)) => {
                println!("{}", serde_json::to_string_pretty(topic.level(level))?);
            }
            (OutputFormat::Yaml, None) => print!("{}", serde_yaml::to_string(&**topic)?),
            (OutputFormat::Yaml, Some(level)) => {
                print!("{}", serde_yaml::to_string(topic.level(level))?);
            }
        }

        Ok(())
    }
}

fn output_pretty(topic: &Topic, only: Option<Level>, referrers: &[String]) {
    println!("{}", topic.name().heading());
    println!(
        "{}",
        format!(
            "{} · {} · {} · v{} · updated {}",
            topic.id(),
            topic.kind(),
            topic.status(),
            topic.version(),
            topic.updated_at().format("%Y-%m-%d")
        )
        .dim()
    );
    if !topic.alternate_names().is_empty() {
        println!("Also known as: {}", topic.alternate_names().join(", "));
    }
    if let Some(hpo) = topic.hpo_id() {
        println!("HPO: {hpo}");
    }

    for (level, content) in topic.levels().iter() {
        if only.is_none_or(|only| only == level) {
            output_level(level, content);
        }
    }

    if !topic.cross_references().is_empty() {
        println!("\n{}", "See also".heading());
        for reference in topic.cross_references() {
            println!(
                "  • {} {}",
                reference.label,
                format!("({} → {})", reference.relationship, reference.target_id).dim()
            );
        }
    }

    if !referrers.is_empty() {
        println!("\n{}", "Referenced by".heading());
        for id in referrers {
            println!("  • {id}");
        }
    }

    if !topic.citations().is_empty() {
        println!("\n{}", "Sources".heading());
        for citation in topic.citations() {
            println!("  • {}. {} [{}]", citation.title, citation.source, citation.kind);
        }
    }
}

fn output_level(level: Level, content: &ContentLevel) {
    println!("\n{}", format!("Level {level}").info());
    println!("{}", content.summary);
    println!("\n{}", content.explanation);

    if !content.key_terms.is_empty() {
        println!("\n{}", "Key terms".heading());
        for term in &content.key_terms {
            match &term.pronunciation {
                Some(pronunciation) => println!(
                    "  • {} {}: {}",
                    term.term,
                    format!("({pronunciation})").dim(),
                    term.definition
                ),
                None => println!("  • {}: {}", term.term, term.definition),
            }
        }
    }

    for analogy in &content.analogies {
        println!("{}", format!("  ≈ {analogy}").dim());
    }

    if let Some(notes) = &content.clinical_notes {
        println!("\n{} {notes}", "Clinical notes:".warning());
    }
}
