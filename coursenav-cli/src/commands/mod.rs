//! CLI command implementations.

pub mod check;
pub mod index;
pub mod report;

pub use check::check_content;
pub use index::{index_content, IndexOptions};

use anyhow::{Context, Result};
use coursenav_core::{Config, IndexError};
use std::path::{Path, PathBuf};

/// Exit code for I/O and configuration failures outside the indexer
const EXIT_IO: u8 = 2;

/// Map a command failure to the process exit code
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<IndexError>()
        .map(|e| e.exit_code() as u8)
        .unwrap_or(EXIT_IO)
}

/// Load the optional config file and apply command-line overrides
///
/// Paths from the config file are relative to the file; paths from the
/// command line are relative to the working directory.
pub fn load_config(
    config_path: &Path,
    content_dir: Option<PathBuf>,
    strict: bool,
) -> Result<Config> {
    let mut config = Config::from_file_or_default(config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", config_path))?;

    if let Some(dir) = content_dir {
        config.content_dir = Some(from_working_dir(dir)?);
    }
    config.strict |= strict;

    Ok(config)
}

/// Anchor a command-line path at the working directory
pub fn from_working_dir(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    Ok(cwd.join(path))
}
