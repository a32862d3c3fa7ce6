//! Content model structs for documents and the site index.

use coursenav_types::{IndexReport, NavNode, QuizQuestion};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;

/// Kind of content page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Docs,
    #[default]
    Other,
}

/// Unknown types read as [`DocType::Other`]
impl FromStr for DocType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "docs" => DocType::Docs,
            _ => DocType::Other,
        })
    }
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Docs => "docs",
            DocType::Other => "other",
        }
    }
}

/// Raw front-matter block as written by authors
///
/// Unknown keys land in `extra` and are carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: Option<String>,

    #[serde(rename = "linkTitle")]
    #[serde(default, deserialize_with = "scalar_string")]
    pub link_title: Option<String>,

    /// Kept as a raw value so a non-integer can be reported instead of failing the block
    #[serde(default)]
    pub nav_weight: Option<serde_yaml::Value>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub canonical: Option<String>,

    #[serde(rename = "type")]
    #[serde(default, deserialize_with = "scalar_string")]
    pub doc_type: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Frontmatter {
    /// Keys with a meaning to the indexer
    pub const KNOWN_KEYS: [&'static str; 5] = ["title", "linkTitle", "nav_weight", "canonical", "type"];
}

/// Accept any YAML scalar for a string field (`title: 2024` is a title, not an error)
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a scalar, found {}",
            yaml_kind(&other)
        ))),
    }
}

pub(crate) fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// A single logical document: one front-matter block and the body after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    /// Navigation path (`1/3/2/2`, or `1/3/2/2#1` for the second block of a file)
    pub path: String,

    /// Relative file the document was read from
    pub file: String,

    /// Position of the block inside its file
    pub block: usize,

    /// Human-readable origin (`file`, or `file#n` in multi-block files)
    pub source: String,

    pub title: String,

    pub link_title: Option<String>,

    /// Explicit weight; `None` means "use insertion order"
    pub nav_weight: Option<i64>,

    pub canonical_url: Option<String>,

    pub doc_type: DocType,

    /// Unrecognized front-matter keys
    pub extra: BTreeMap<String, serde_yaml::Value>,

    /// Raw markdown after the front matter
    pub body: String,
}

impl ContentDocument {
    /// Canonical input ordering: by file, then by block within the file
    pub fn order_key(&self) -> (&str, usize) {
        (&self.file, self.block)
    }
}

/// Everything one indexing run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteIndex {
    pub navigation: NavNode,

    /// Extracted questions keyed by document path; documents without questions are omitted
    pub quizzes: BTreeMap<String, Vec<QuizQuestion>>,

    pub report: IndexReport,
}

impl SiteIndex {
    /// Questions for a document path
    pub fn quizzes_for(&self, path: &str) -> &[QuizQuestion] {
        self.quizzes.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn question_count(&self) -> usize {
        self.quizzes.values().map(Vec::len).sum()
    }
}
