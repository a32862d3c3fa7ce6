//! Run the indexing pipeline without writing output and surface issues.

use super::load_config;
use super::report::{print_json, print_summary, run_indexer};
use anyhow::Result;
use coursenav_core::Indexer;
use std::path::{Path, PathBuf};

pub fn check_content(
    config_path: &Path,
    content_dir: Option<PathBuf>,
    strict: bool,
    json: bool,
) -> Result<()> {
    let config = load_config(config_path, content_dir, strict)?;
    let index = run_indexer(&Indexer::new(config), json)?;

    if json {
        print_json(&index.report)?;
    } else {
        print_summary(&index.report);
    }

    Ok(())
}
