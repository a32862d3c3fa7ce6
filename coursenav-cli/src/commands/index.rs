//! Index command implementation.

use super::{from_working_dir, load_config};
use super::report::{print_json, print_summary, run_indexer};
use anyhow::{Context, Result};
use coursenav_core::{Indexer, SiteIndex};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub content_dir: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub strict: bool,
    pub pretty: bool,
    pub json: bool,
    pub threads: Option<usize>,
}

/// Index the content directory and write the JSON artifacts
pub fn index_content(config_path: &Path, opts: IndexOptions) -> Result<()> {
    let mut config = load_config(config_path, opts.content_dir, opts.strict)?;
    if let Some(out) = opts.out {
        config.output_dir = Some(from_working_dir(out)?);
    }
    if let Some(threads) = opts.threads {
        config.threads = threads;
    }
    let pretty = opts.pretty || config.pretty;

    let output_dir = config
        .output_dir()
        .context("No output directory: pass --out or set output_dir in the config")?;

    tracing::info!("Indexing {:?}", config.content_dir);

    let indexer = Indexer::new(config);
    let index = run_indexer(&indexer, opts.json)?;

    write_artifacts(&output_dir, &index, pretty)?;

    if opts.json {
        print_json(&index.report)?;
    } else {
        print_summary(&index.report);
    }

    tracing::info!("✓ Output written to {:?}", output_dir);

    Ok(())
}

/// Write navigation.json, quizzes.json and report.json
fn write_artifacts(output_dir: &Path, index: &SiteIndex, pretty: bool) -> Result<()> {
    fs::create_dir_all(output_dir).context("Failed to create output directory")?;

    write_json(
        &output_dir.join("navigation.json"),
        serde_json::to_value(&index.navigation)?,
        pretty,
    )?;
    write_json(
        &output_dir.join("quizzes.json"),
        serde_json::to_value(&index.quizzes)?,
        pretty,
    )?;
    write_json(
        &output_dir.join("report.json"),
        serde_json::to_value(&index.report)?,
        pretty,
    )?;

    Ok(())
}

fn write_json(path: &Path, value: Value, pretty: bool) -> Result<()> {
    let payload = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    fs::write(path, payload).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}
