//! Indexing run - discovers content, parses it in parallel and aggregates.

use crate::{
    config::{Config, ConfigError},
    frontmatter::{parse, ParseError},
    models::{ContentDocument, SiteIndex},
    navigation::{DuplicatePathError, NavTree},
    paths::{is_markdown_file, to_slash_path},
    quiz::collect_quizzes,
};
use coursenav_types::{
    FieldWarning, IndexReport, InvalidFrontMatterEntry, MalformedQuizEntry, QuizQuestion,
};
use rayon::prelude::*;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error at {path:?}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{error}")]
    DuplicatePath {
        error: DuplicatePathError,
        report: Box<IndexReport>,
    },

    #[error("Strict mode: {} recoverable issue(s) found", .report.issue_count())]
    Strict { report: Box<IndexReport> },

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl IndexError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            IndexError::DuplicatePath { .. } | IndexError::Strict { .. } => 1,
            IndexError::WorkerPool(_) => 1,
            IndexError::Io { .. } | IndexError::Config(_) => 2,
        }
    }

    /// Report describing the failed run, with `fatal_error` filled in
    pub fn report(&self) -> IndexReport {
        let mut report = match self {
            IndexError::DuplicatePath { report, .. } | IndexError::Strict { report } => {
                (**report).clone()
            }
            _ => IndexReport::default(),
        };
        report.fatal_error = Some(self.to_string());
        report
    }

    fn io(path: &Path, error: std::io::Error) -> Self {
        IndexError::Io {
            path: path.to_path_buf(),
            error,
        }
    }
}

/// Result of the per-file stage
#[derive(Debug, Default)]
struct FileOutcome {
    documents: Vec<ContentDocument>,
    warnings: Vec<FieldWarning>,
    quizzes: Vec<(String, Vec<QuizQuestion>)>,
    malformed: Vec<MalformedQuizEntry>,
    /// Whole files or single blocks left out of the tree
    skipped: Vec<ParseError>,
}

/// Runs one indexing pass over a content directory
pub struct Indexer {
    config: Config,
}

impl Indexer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Index the whole content directory
    pub fn run(&self) -> Result<SiteIndex, IndexError> {
        let content_dir = self.config.content_dir()?;
        let files = self.discover_markdown_files(&content_dir)?;

        tracing::info!("Found {} markdown files", files.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()?;

        // Per-file stage; `collect` keeps the input order
        let outcomes: Vec<Result<FileOutcome, IndexError>> = pool.install(|| {
            files
                .par_iter()
                .map(|rel| process_file(&content_dir, rel))
                .collect()
        });

        // Aggregation barrier: everything below sees the complete set
        let mut report = IndexReport::default();
        let mut documents = Vec::new();
        let mut quizzes = BTreeMap::new();

        for outcome in outcomes {
            let mut outcome = outcome?;
            for skipped in outcome.skipped.drain(..) {
                match skipped {
                    ParseError::MissingFrontMatter { location } => {
                        report.missing_front_matter.push(location);
                    }
                    ParseError::InvalidFrontMatter { location, reason } => {
                        report.invalid_front_matter.push(InvalidFrontMatterEntry {
                            source: location,
                            reason,
                        });
                    }
                }
            }
            documents.append(&mut outcome.documents);
            report.warnings.append(&mut outcome.warnings);
            report.malformed_quizzes.append(&mut outcome.malformed);
            quizzes.extend(outcome.quizzes);
        }

        report.documents = documents.len();
        report.questions = quizzes.values().map(Vec::len).sum();

        let navigation = match NavTree::build(&documents) {
            Ok(tree) => tree,
            Err(error) => {
                return Err(IndexError::DuplicatePath {
                    error,
                    report: Box::new(report),
                })
            }
        };

        if self.config.strict && report.has_issues() {
            tracing::error!(
                "Strict mode: {} recoverable issue(s) promoted to errors",
                report.issue_count()
            );
            return Err(IndexError::Strict {
                report: Box::new(report),
            });
        }

        tracing::info!(
            "Indexed {} documents, {} questions, {} issue(s)",
            report.documents,
            report.questions,
            report.issue_count()
        );

        Ok(SiteIndex {
            navigation: navigation.into_root(),
            quizzes,
            report,
        })
    }

    /// Discover all markdown files, as sorted paths relative to the content root
    fn discover_markdown_files(&self, content_dir: &Path) -> Result<Vec<String>, IndexError> {
        let meta = fs::metadata(content_dir).map_err(|e| IndexError::io(content_dir, e))?;
        if !meta.is_dir() {
            return Err(IndexError::io(
                content_dir,
                std::io::Error::other("content path is not a directory"),
            ));
        }

        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns);
        let mut files = Vec::new();

        for entry in WalkDir::new(content_dir) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(content_dir).to_path_buf();
                IndexError::Io {
                    path,
                    error: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if !is_markdown_file(entry.path()) {
                continue;
            }

            let rel = to_slash_path(entry.path().strip_prefix(content_dir).unwrap_or(entry.path()));
            if should_ignore(&rel, &ignore_patterns) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                continue;
            }
            files.push(rel);
        }

        files.sort();
        Ok(files)
    }
}

/// Read, parse and extract quizzes for one file
fn process_file(content_dir: &Path, rel: &str) -> Result<FileOutcome, IndexError> {
    let full_path = content_dir.join(rel);
    let raw = fs::read_to_string(&full_path).map_err(|e| IndexError::io(&full_path, e))?;

    let parsed = match parse(&raw, rel) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!("Skipping {}", err);
            return Ok(FileOutcome {
                skipped: vec![err],
                ..Default::default()
            });
        }
    };

    for err in &parsed.errors {
        tracing::warn!("Skipping block {}", err);
    }

    let mut outcome = FileOutcome {
        warnings: parsed.warnings,
        skipped: parsed.errors,
        ..Default::default()
    };

    for doc in &parsed.documents {
        let (questions, errors) = collect_quizzes(&doc.body);
        for err in errors {
            tracing::warn!("{}: skipping {}", doc.source, err);
            outcome.malformed.push(MalformedQuizEntry {
                path: doc.path.clone(),
                question_index: err.question_index,
                reason: err.reason.to_string(),
            });
        }
        if !questions.is_empty() {
            tracing::debug!("{}: {} quiz question(s)", doc.source, questions.len());
            outcome.quizzes.push((doc.path.clone(), questions));
        }
    }

    outcome.documents = parsed.documents;
    Ok(outcome)
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_content_dir_is_io_error() {
        let dir = tempdir().unwrap();
        let indexer = Indexer::new(Config::for_content_dir(dir.path().join("nope")));
        let err = indexer.run().unwrap_err();
        assert!(matches!(err, IndexError::Io { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(err.report().fatal_error.is_some());
    }

    #[test]
    fn test_io_error_names_its_cause_once() {
        let dir = tempdir().unwrap();
        let err = Indexer::new(Config::for_content_dir(dir.path().join("nope")))
            .run()
            .unwrap_err();

        let IndexError::Io { error, .. } = &err else {
            panic!("expected Io, got {:?}", err);
        };
        let cause = error.to_string();
        let mut chain = err.to_string();
        let mut next = std::error::Error::source(&err);
        while let Some(inner) = next {
            chain.push_str(": ");
            chain.push_str(&inner.to_string());
            next = inner.source();
        }
        assert_eq!(chain.matches(&cause).count(), 1, "{}", chain);
    }

    #[test]
    fn test_uppercase_extension_is_discovered() {
        let dir = tempdir().unwrap();
        write(dir.path(), "1/Intro.MD", "---\ntitle: Intro\n---\n");
        write(dir.path(), "1/b.md", "---\ntitle: B\n---\n");

        let index = Indexer::new(Config::for_content_dir(dir.path())).run().unwrap();
        assert_eq!(index.report.documents, 2);
        assert!(index.navigation.find("1/Intro").is_some());
    }

    #[test]
    fn test_bad_block_is_reported_and_siblings_kept() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "1/c.md",
            "---\ntitle: One\n---\nFirst.\n---\ntitle: Clojure: Basics\n---\nSecond.\n",
        );

        let index = Indexer::new(Config::for_content_dir(dir.path())).run().unwrap();
        assert_eq!(index.report.documents, 1);
        assert!(index.navigation.find("1/c#0").is_some());
        assert!(index.navigation.find("1/c#1").is_none());
        assert_eq!(index.report.invalid_front_matter.len(), 1);
        assert_eq!(index.report.invalid_front_matter[0].source, "1/c.md#1");
    }

    #[test]
    fn test_ignore_patterns_skip_files() {
        let dir = tempdir().unwrap();
        write(dir.path(), "1/a.md", "---\ntitle: A\n---\n");
        write(dir.path(), "drafts/b.md", "no front matter");

        let mut config = Config::for_content_dir(dir.path());
        config.ignore_patterns = vec!["^drafts/".to_string(), "[unclosed".to_string()];
        let index = Indexer::new(config).run().unwrap();

        assert!(index.report.missing_front_matter.is_empty());
        assert_eq!(index.report.documents, 1);
    }

    #[test]
    fn test_non_markdown_files_are_ignored() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.md", "---\ntitle: A\n---\n");
        write(dir.path(), "notes.txt", "plain text");

        let index = Indexer::new(Config::for_content_dir(dir.path())).run().unwrap();
        assert_eq!(index.report.documents, 1);
        assert!(!index.report.has_issues());
    }

    #[test]
    fn test_strict_mode_promotes_warnings() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.md", "---\ntitle: A\nnav_weight: soon\n---\n");

        let mut config = Config::for_content_dir(dir.path());
        config.strict = true;
        let err = Indexer::new(config).run().unwrap_err();
        assert!(matches!(err, IndexError::Strict { .. }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.report().warnings.len(), 1);
    }

    #[test]
    fn test_explicit_thread_count() {
        let dir = tempdir().unwrap();
        for i in 0..8 {
            write(
                dir.path(),
                &format!("ch/{}.md", i),
                &format!("---\ntitle: Chapter {}\nnav_weight: {}\n---\n", i, 8 - i),
            );
        }

        let mut config = Config::for_content_dir(dir.path());
        config.threads = 2;
        let index = Indexer::new(config).run().unwrap();
        let chapter = index.navigation.find("ch").unwrap();
        assert_eq!(chapter.children.first().unwrap().path, "ch/7");
        assert_eq!(chapter.children.last().unwrap().path, "ch/0");
    }
}
