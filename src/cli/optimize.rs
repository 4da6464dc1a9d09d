//! Optimize command implementation

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::config::{Config, ConfigOverrides};
use crate::optimize::Optimizer;
use crate::utils::plural;

/// Merge undersized shared chunks until the graph is stable
#[derive(Args, Debug)]
pub struct OptimizeCommand {
    /// Chunk graph JSON produced by the splitting pass
    pub graph: PathBuf,

    /// Write the optimized graph here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Merge multi-group chunks estimated below this size
    #[arg(long, env = "COALESCE_MIN_CHUNK_SIZE")]
    pub min_chunk_size: Option<f64>,

    /// Fixed per-chunk overhead added to size estimates
    #[arg(long)]
    pub chunk_overhead: Option<f64>,

    /// Size factor for chunks loaded by an entry point
    #[arg(long)]
    pub entry_chunk_multiplicator: Option<f64>,
}

impl OptimizeCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Config::resolve(config_path, self.into())?;

        let mut graph = super::load_graph(&self.graph).await?;

        eprintln!(
            "{} Optimizing {}...",
            "→".blue(),
            plural(graph.len(), "chunk")
        );

        let optimizer = Optimizer::new(config.optimize.consolidate_options())?;
        let report = optimizer.run(&mut graph)?;

        let description = graph.to_description();
        let json = if config.output.pretty {
            serde_json::to_string_pretty(&description)?
        } else {
            serde_json::to_string(&description)?
        };

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, json)
                    .await
                    .with_context(|| format!("Failed to write chunk graph: {}", path.display()))?;
            }
            None => println!("{}", json),
        }

        eprintln!(
            "\n{} Merged {} in {:.2}s ({} → {})\n",
            "✓".green().bold(),
            plural(report.merges.len(), "chunk"),
            report.duration.as_secs_f64(),
            report.chunks_before,
            report.chunks_after
        );

        Ok(())
    }
}

impl From<&OptimizeCommand> for ConfigOverrides {
    fn from(cmd: &OptimizeCommand) -> Self {
        Self {
            min_chunk_size: cmd.min_chunk_size,
            chunk_overhead: cmd.chunk_overhead,
            entry_chunk_multiplicator: cmd.entry_chunk_multiplicator,
        }
    }
}
