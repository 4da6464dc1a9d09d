//! Configuration initialization command

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::config::Config;

/// Write a default coalesce.toml
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Directory to write coalesce.toml into
    #[arg(default_value = ".")]
    pub dir: String,

    /// Overwrite an existing coalesce.toml
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub async fn execute(&self) -> Result<()> {
        let dir = Path::new(&self.dir);
        let path = dir.join("coalesce.toml");

        if path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }

        fs::create_dir_all(dir).context("Failed to create config directory")?;

        let content = format!(
            "# Coalesce configuration\n\n{}",
            Config::default_config().to_toml()?
        );
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        eprintln!(
            "{} Created {}\n",
            "✓".green().bold(),
            path.display().to_string().cyan()
        );

        Ok(())
    }
}
