use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use edcat::{SortKey, Topic};
use regex::Regex;
use tracing::instrument;

use super::terminal::{self, Colorize};

/// Command arguments for `edcat list`.
#[derive(Debug, Parser)]
#[command(about = "List topic records")]
pub struct List {
    /// Only list topics in this category, in declared order.
    #[arg(long, value_name = "NAME")]
    category: Option<String>,

    /// Sort field (default: id). Ignored with `--category`.
    #[arg(long, value_enum, default_value_t)]
    sort: SortField,

    /// Regular expression matched against id, name and alternate names.
    #[arg(long, value_name = "REGEX")]
    regex: Option<String>,

    /// Suppress headers and print only ids.
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum SortField {
    #[default]
    Id,
    Name,
    Updated,
}

impl From<SortField> for SortKey {
    fn from(field: SortField) -> Self {
        match field {
            SortField::Id => Self::Id,
            SortField::Name => Self::Name,
            SortField::Updated => Self::UpdatedAt,
        }
    }
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let regex = self
            .regex
            .as_deref()
            .map(Regex::new)
            .transpose()
            .context("Invalid --regex pattern")?;

        let library = super::load(root)?;

        let topics: Vec<&Arc<Topic>> = match &self.category {
            Some(category) => library.registry().by_category(category)?.iter().collect(),
            None => library.store().sorted(self.sort.into()),
        };

        let topics: Vec<_> = topics
            .into_iter()
            .filter(|topic| regex.as_ref().is_none_or(|regex| matches(regex, topic)))
            .collect();

        if self.quiet {
            for topic in &topics {
                println!("{}", topic.id());
            }
            return Ok(());
        }

        if topics.is_empty() {
            println!("No topics matched.");
            return Ok(());
        }

        output_table(&topics);
        Ok(())
    }
}

fn matches(regex: &Regex, topic: &Topic) -> bool {
    regex.is_match(topic.id())
        || regex.is_match(topic.name())
        || topic.alternate_names().iter().any(|name| regex.is_match(name))
}

fn output_table(topics: &[&Arc<Topic>]) {
    let id_width = topics
        .iter()
        .map(|topic| topic.id().len())
        .max()
        .unwrap_or_default()
        .max(2);

    if terminal::is_narrow() {
        println!("{}", format!("{:id_width$}  NAME", "ID").dim());
        for topic in topics {
            println!("{:id_width$}  {}", topic.id().as_str(), topic.name());
        }
    } else {
        let name_width = usize::from(terminal::terminal_width().unwrap_or(100))
            .saturating_sub(id_width + 32)
            .max(16);
        println!(
            "{}",
            format!("{:id_width$}  {:10} {:9} {:>3}  NAME", "ID", "TYPE", "STATUS", "V").dim()
        );
        for topic in topics {
            println!(
                "{:id_width$}  {:10} {:9} {:>3}  {}",
                topic.id().as_str(),
                topic.kind().as_str(),
                topic.status().as_str(),
                topic.version(),
                terminal::truncate(topic.name(), name_width)
            );
        }
    }

    println!("\n{}", format!("{} topics", topics.len()).dim());
}
