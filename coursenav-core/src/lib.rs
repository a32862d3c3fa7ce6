//! # coursenav-core
//!
//! Core library for the coursenav content indexer.
//!
//! This crate parses front-matter annotated markdown, extracts embedded
//! quizdown questions and builds the ordered navigation tree for a content
//! directory.

pub mod config;
pub mod frontmatter;
pub mod indexer;
pub mod models;
pub mod navigation;
pub mod paths;
pub mod quiz;

pub use config::{Config, ConfigError};
pub use frontmatter::{parse, parse_document, ParseError, ParsedFile};
pub use indexer::{IndexError, Indexer};
pub use models::{ContentDocument, DocType, Frontmatter, SiteIndex};
pub use navigation::{DuplicatePath, DuplicatePathError, NavTree};
pub use paths::document_path;
pub use quiz::{collect_quizzes, extract_quizzes, MalformedQuizError, QuizDefect, Quizzes};

pub use coursenav_types::{IndexReport, NavNode, QuizOption, QuizQuestion};
