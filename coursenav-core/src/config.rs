//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Indexer configuration matching the coursenav.yml schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Directory holding the markdown content
    #[serde(default)]
    pub content_dir: Option<PathBuf>,

    /// Directory the JSON artifacts are written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Promote every recoverable issue to a fatal error
    #[serde(default)]
    pub strict: bool,

    /// Regexes matched against paths relative to the content directory
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Worker threads for per-file parsing (0 = one per core)
    #[serde(default)]
    pub threads: usize,

    /// Pretty-print the JSON artifacts
    #[serde(default)]
    pub pretty: bool,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load the file when it exists, otherwise fall back to defaults
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Configuration for a content directory with everything else defaulted
    pub fn for_content_dir(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: Some(content_dir.into()),
            ..Self::default()
        }
    }

    /// Content directory, resolved relative to the config file
    pub fn content_dir(&self) -> Result<PathBuf, ConfigError> {
        self.content_dir
            .as_deref()
            .map(|p| self.resolve_path(p))
            .ok_or_else(|| ConfigError::MissingField("content_dir".to_string()))
    }

    /// Output directory, resolved relative to the config file
    pub fn output_dir(&self) -> Result<PathBuf, ConfigError> {
        self.output_dir
            .as_deref()
            .map(|p| self.resolve_path(p))
            .ok_or_else(|| ConfigError::MissingField("output_dir".to_string()))
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}
