//! Command-line interface for Coalesce
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `optimize`: Merge undersized shared chunks of a chunk graph
//! - `check`: Validate a chunk graph
//! - `init`: Write a starter configuration

mod check;
mod init;
mod optimize;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use crate::graph::{ChunkGraph, GraphDescription};

pub use check::CheckCommand;
pub use init::InitCommand;
pub use optimize::OptimizeCommand;

/// Coalesce - merges undersized multi-consumer chunks in a chunk graph
#[derive(Parser, Debug)]
#[command(name = "coalesce")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to coalesce.toml config file
    #[arg(short, long, global = true, default_value = "coalesce.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge undersized shared chunks until the graph is stable
    Optimize(OptimizeCommand),

    /// Validate a chunk graph without changing it
    Check(CheckCommand),

    /// Write a default coalesce.toml
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Optimize(cmd) => cmd.execute(&self.config).await,
            Commands::Check(cmd) => cmd.execute().await,
            Commands::Init(cmd) => cmd.execute().await,
        }
    }
}

/// Read and validate a chunk graph description
pub(crate) async fn load_graph(path: &Path) -> Result<ChunkGraph> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read chunk graph: {}", path.display()))?;

    let description: GraphDescription = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse chunk graph: {}", path.display()))?;

    let graph = ChunkGraph::from_description(&description)
        .with_context(|| format!("Invalid chunk graph: {}", path.display()))?;

    debug!(
        "Loaded {} chunks and {} modules from {}",
        graph.len(),
        graph.module_count(),
        path.display()
    );

    Ok(graph)
}

/// Print the Coalesce banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "⚡".cyan(),
        "Coalesce".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
