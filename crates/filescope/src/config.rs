//! Configuration for a selection run
//!
//! Settings arrive as named string values. The names are fixed for
//! compatibility with existing build environments.

use crate::error::{Result, ScopeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_INCLUDE: &str = "LGTM_INDEX_INCLUDE";
pub const ENV_EXCLUDE: &str = "LGTM_INDEX_EXCLUDE";
pub const ENV_FILTERS: &str = "LGTM_INDEX_FILTERS";
pub const ENV_TYPESCRIPT: &str = "LGTM_INDEX_TYPESCRIPT";
pub const ENV_REPOSITORY_FOLDERS_CSV: &str = "LGTM_REPOSITORY_FOLDERS_CSV";
pub const ENV_SOURCE_ROOT: &str = "LGTM_SRC";
pub const ENV_DIST: &str = "SEMMLE_DIST";

/// Location of the externs under a distribution directory.
pub const EXTERNS_SUBDIR: [&str; 3] = ["tools", "data", "externs"];

/// Raw, unparsed index settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Newline-separated paths to include (`LGTM_INDEX_INCLUDE`)
    #[serde(default)]
    pub include: Option<String>,

    /// Newline-separated paths to exclude (`LGTM_INDEX_EXCLUDE`)
    #[serde(default)]
    pub exclude: Option<String>,

    /// Newline-separated `include:<glob>` / `exclude:<glob>` lines (`LGTM_INDEX_FILTERS`)
    #[serde(default)]
    pub filters: Option<String>,

    /// TypeScript mode: unset, `basic` or `none` (`LGTM_INDEX_TYPESCRIPT`)
    #[serde(default)]
    pub typescript: Option<String>,

    /// Path to the repository folder classification CSV (`LGTM_REPOSITORY_FOLDERS_CSV`)
    #[serde(default)]
    pub repository_folders_csv: Option<PathBuf>,
}

impl IndexSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary name lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            include: lookup(ENV_INCLUDE),
            exclude: lookup(ENV_EXCLUDE),
            filters: lookup(ENV_FILTERS),
            typescript: lookup(ENV_TYPESCRIPT),
            repository_folders_csv: lookup(ENV_REPOSITORY_FOLDERS_CSV)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Overlay every field that is set in `other`.
    pub fn merged_with(mut self, other: IndexSettings) -> Self {
        if other.include.is_some() {
            self.include = other.include;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
        if other.filters.is_some() {
            self.filters = other.filters;
        }
        if other.typescript.is_some() {
            self.typescript = other.typescript;
        }
        if other.repository_folders_csv.is_some() {
            self.repository_folders_csv = other.repository_folders_csv;
        }
        self
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: IndexSettings =
            toml::from_str(&content).map_err(|e| ScopeError::Config(e.to_string()))?;
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ScopeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Normalized configuration handed to the selector
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Root of the tree to scan
    pub root: PathBuf,
    /// Rule settings
    pub settings: IndexSettings,
    /// Directory of extern definition files selected in addition to the tree
    pub externs_dir: Option<PathBuf>,
}

impl SelectorConfig {
    pub fn new(root: impl Into<PathBuf>, settings: IndexSettings) -> Self {
        Self {
            root: root.into(),
            settings,
            externs_dir: None,
        }
    }

    pub fn with_externs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.externs_dir = Some(dir.into());
        self
    }

    /// Build from `LGTM_SRC`, `SEMMLE_DIST` and the `LGTM_INDEX_*` variables.
    pub fn from_env() -> Result<Self> {
        let root = std::env::var(ENV_SOURCE_ROOT)
            .map_err(|_| ScopeError::Config(format!("{} is not set", ENV_SOURCE_ROOT)))?;
        let mut config = Self::new(root, IndexSettings::from_env());
        config.externs_dir = std::env::var(ENV_DIST)
            .ok()
            .map(|dist| externs_dir_for(Path::new(&dist)));
        Ok(config)
    }
}

/// The externs directory inside a distribution directory.
pub fn externs_dir_for(dist: &Path) -> PathBuf {
    EXTERNS_SUBDIR.iter().fold(dist.to_path_buf(), |p, s| p.join(s))
}
