//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::index::Recency;
use crate::review::{EasinessScale, SchedulerConfig};
use crate::workspace::{DEFAULT_FLASHCARD_DEBOUNCE, WorkspaceConfig};

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default vault directory
    pub dir: Option<PathBuf>,

    /// Tags left out of tag groups
    pub ignored_tags: Vec<String>,

    /// Delays before the first reviews of a flashcard, in minutes
    pub initial_delay_minutes: Option<Vec<i64>>,

    /// Quiet period before flashcard updates from storage are merged
    pub flashcard_debounce_ms: Option<u64>,

    /// How a tag's recency is folded over its subtree
    pub tag_recency: Recency,

    /// Which number drives the flashcard easiness update
    pub easiness_scale: EasinessScale,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, defaulting when it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/kasten/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kasten")
            .join("config.toml")
    }

    /// Resolve the vault directory, with CLI argument taking precedence.
    ///
    /// Precedence order:
    /// 1. CLI `--dir` argument
    /// 2. Config file `dir` setting
    /// 3. Current working directory
    pub fn notes_dir(&self, cli_dir: Option<&PathBuf>) -> PathBuf {
        cli_dir
            .cloned()
            .or_else(|| self.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns the vault database path for a vault directory.
    pub fn vault_path(notes_dir: &Path) -> PathBuf {
        notes_dir.join(".kasten").join("vault.db")
    }

    /// Builds workspace settings from the configured values.
    pub fn workspace_config(&self) -> WorkspaceConfig {
        WorkspaceConfig {
            ignored_tags: self.ignored_tags.iter().cloned().collect(),
            recency: self.tag_recency,
            scheduler: self
                .initial_delay_minutes
                .as_deref()
                .map(SchedulerConfig::from_minutes)
                .unwrap_or_default()
                .with_easiness_scale(self.easiness_scale),
            flashcard_debounce: self
                .flashcard_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_FLASHCARD_DEBOUNCE),
        }
    }
}
