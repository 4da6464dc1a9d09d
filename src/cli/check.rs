//! Check command implementation

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::utils::plural;

/// Validate a chunk graph without changing it
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Chunk graph JSON to validate
    pub graph: PathBuf,
}

impl CheckCommand {
    pub async fn execute(&self) -> Result<()> {
        let graph = super::load_graph(&self.graph).await?;

        let shared = graph
            .chunks()
            .filter(|c| graph.number_of_groups(c.id) > 1)
            .count();

        eprintln!(
            "{} {} is valid: {} ({} shared), {}, {}\n",
            "✓".green().bold(),
            self.graph.display().to_string().cyan(),
            plural(graph.len(), "chunk"),
            shared,
            plural(graph.groups().count(), "group"),
            plural(graph.module_count(), "module")
        );

        Ok(())
    }
}
