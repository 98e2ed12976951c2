use std::{collections::HashSet, path::PathBuf};

use clap::Parser;
use edcat::Category;
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "List domains and the categories they group")]
pub struct Categories {
    /// List the member topic ids of each category
    #[arg(long)]
    members: bool,
}

impl Categories {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let library = super::load(root)?;
        let registry = library.registry();

        if registry.categories().next().is_none() {
            println!("No categories declared in manifest.toml.");
            return Ok(());
        }

        let mut grouped = HashSet::new();
        for domain in registry.domains() {
            println!("{}", domain.heading());
            for category in registry.by_domain(domain)? {
                grouped.insert(category.name());
                self.print_category(category, "  ");
            }
        }

        let ungrouped: Vec<_> = registry
            .categories()
            .filter(|category| !grouped.contains(category.name()))
            .collect();
        if !ungrouped.is_empty() {
            if registry.domains().next().is_some() {
                println!("{}", "(no domain)".dim());
            }
            for category in ungrouped {
                self.print_category(category, "  ");
            }
        }

        Ok(())
    }

    fn print_category(&self, category: &Category, indent: &str) {
        println!(
            "{indent}{} {}",
            category.name(),
            format!("({} topics)", category.topics().len()).dim()
        );
        if self.members {
            for topic in category.topics() {
                println!("{indent}  • {}", topic.id());
            }
        }
    }
}
