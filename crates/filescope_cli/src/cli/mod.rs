//! CLI commands
//!
//! - `select`: list the files to extract
//! - `explain`: show the decision for individual paths

pub mod error;
pub mod explain;
pub mod select;

use anyhow::{Context, Result};
use clap::Args;
use filescope::config::{
    externs_dir_for, ENV_DIST, ENV_EXCLUDE, ENV_FILTERS, ENV_INCLUDE, ENV_REPOSITORY_FOLDERS_CSV,
    ENV_TYPESCRIPT,
};
use filescope::{IndexSettings, SelectorConfig};
use std::path::PathBuf;

/// Rule settings shared by every command. Each flag falls back to its `LGTM_*` variable.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Paths to include, relative to the root (repeat or separate with newlines)
    #[arg(long, env = ENV_INCLUDE)]
    pub include: Vec<String>,

    /// Paths to exclude, relative to the root (repeat or separate with newlines)
    #[arg(long, env = ENV_EXCLUDE)]
    pub exclude: Vec<String>,

    /// Glob filters, one `include:<glob>` or `exclude:<glob>` per value or line
    #[arg(long = "filter", env = ENV_FILTERS)]
    pub filters: Vec<String>,

    /// TypeScript mode: `basic` or `none`
    #[arg(long, env = ENV_TYPESCRIPT)]
    pub typescript: Option<String>,

    /// CSV table of classified repository folders
    #[arg(long, env = ENV_REPOSITORY_FOLDERS_CSV)]
    pub repository_folders_csv: Option<PathBuf>,

    /// TOML file with default settings (flags and environment override it)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory of extern definitions to select in addition to the tree
    #[arg(long)]
    pub externs_dir: Option<PathBuf>,

    /// Distribution directory; externs are read from its tools/data/externs
    #[arg(long, env = ENV_DIST, hide_env_values = true)]
    pub dist: Option<PathBuf>,
}

fn joined(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join("\n"))
    }
}

impl SettingsArgs {
    /// Settings given on the command line or through the environment.
    pub fn overrides(&self) -> IndexSettings {
        IndexSettings {
            include: joined(&self.include),
            exclude: joined(&self.exclude),
            filters: joined(&self.filters),
            typescript: self.typescript.clone(),
            repository_folders_csv: self
                .repository_folders_csv
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
        }
    }

    /// Build the selector configuration for `root`.
    pub fn to_config(&self, root: PathBuf) -> Result<SelectorConfig> {
        let base = match &self.config {
            Some(path) => IndexSettings::load(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => IndexSettings::default(),
        };
        let settings = base.merged_with(self.overrides());

        let mut config = SelectorConfig::new(root, settings);
        if let Some(dir) = self
            .externs_dir
            .clone()
            .or_else(|| self.dist.as_deref().map(externs_dir_for))
        {
            config = config.with_externs_dir(dir);
        }
        Ok(config)
    }
}
