//! Shared types for coursenav
//!
//! This crate holds the serialized output of an indexing run: the navigation
//! tree, extracted quiz questions and the issue report. Renderers depend on
//! it to read `navigation.json`, `quizzes.json` and `report.json` without
//! pulling in the indexer itself.

use serde::{Deserialize, Serialize};

/// A node of the navigation tree.
///
/// Nodes backed by a document carry its metadata and a `source`. Synthetic
/// nodes stand for a path segment without a document of its own; they have
/// no `source` and take the segment as their title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavNode {
    pub path: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_title: Option<String>,

    /// Effective sort weight
    pub nav_weight: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,

    /// Where the document came from (relative file, plus `#n` for multi-block files)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub children: Vec<NavNode>,
}

impl NavNode {
    /// Create a synthetic node for a path segment
    pub fn synthetic(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            link_title: None,
            nav_weight: 0,
            canonical_url: None,
            source: None,
            children: Vec::new(),
        }
    }

    /// True when no document backs this node
    pub fn is_synthetic(&self) -> bool {
        self.source.is_none()
    }

    /// Title to show in menus (`linkTitle` wins over `title`)
    pub fn menu_title(&self) -> &str {
        self.link_title.as_deref().unwrap_or(&self.title)
    }

    /// Find a node by its full path
    pub fn find(&self, path: &str) -> Option<&NavNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(path))
    }

    /// Pre-order traversal of this node and all descendants
    pub fn walk(&self) -> NavWalk<'_> {
        NavWalk { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including this one
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(NavNode::len).sum::<usize>()
    }

    /// A node always counts itself, so a subtree is never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Paths of the direct children, in menu order
    pub fn child_paths(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.path.as_str()).collect()
    }
}

/// Pre-order iterator over a navigation subtree
pub struct NavWalk<'a> {
    stack: Vec<&'a NavNode>,
}

impl<'a> Iterator for NavWalk<'a> {
    type Item = &'a NavNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// One answer option of a quiz question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub text: String,
    pub is_correct: bool,
}

/// A validated multiple-choice question. Exactly one option is correct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub prompt: String,

    /// Prose or code between the heading and the options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    pub options: Vec<QuizOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// The single correct option
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

/// A question that was skipped because its options were not well formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MalformedQuizEntry {
    pub path: String,
    /// 1-based position of the question in its document
    pub question_index: usize,
    pub reason: String,
}

/// A document whose front matter could not be read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidFrontMatterEntry {
    pub source: String,
    pub reason: String,
}

/// A recoverable problem with a single front-matter field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub source: String,
    /// Stable identifier, e.g. `nav_weight.invalid`
    pub code: String,
    pub message: String,
}

/// Everything an indexing run wants the operator to know about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexReport {
    pub documents: usize,
    pub questions: usize,

    #[serde(default)]
    pub missing_front_matter: Vec<String>,

    #[serde(default)]
    pub invalid_front_matter: Vec<InvalidFrontMatterEntry>,

    #[serde(default)]
    pub malformed_quizzes: Vec<MalformedQuizEntry>,

    #[serde(default)]
    pub warnings: Vec<FieldWarning>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl IndexReport {
    /// Count of recoverable issues (everything except the fatal error)
    pub fn issue_count(&self) -> usize {
        self.missing_front_matter.len()
            + self.invalid_front_matter.len()
            + self.malformed_quizzes.len()
            + self.warnings.len()
    }

    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(path: &str, weight: i64) -> NavNode {
        NavNode {
            path: path.to_string(),
            title: path.to_string(),
            link_title: None,
            nav_weight: weight,
            canonical_url: None,
            source: Some(format!("{}.md", path)),
            children: vec![],
        }
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut root = NavNode::synthetic("", "");
        let mut a = leaf("a", 1);
        a.children.push(leaf("a/x", 1));
        root.children.push(a);
        root.children.push(leaf("b", 2));

        let paths: Vec<&str> = root.walk().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["", "a", "a/x", "b"]);
        assert_eq!(root.len(), 4);
    }

    #[test]
    fn test_find_and_menu_title() {
        let mut root = NavNode::synthetic("", "");
        let mut a = leaf("a", 1);
        a.link_title = Some("Short".into());
        root.children.push(a);

        let found = root.find("a").expect("node a");
        assert_eq!(found.menu_title(), "Short");
        assert!(!found.is_synthetic());
        assert!(root.is_synthetic());
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn test_nav_node_json_shape() {
        let node = leaf("1/3", 130);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["navWeight"], 130);
        assert!(value.get("linkTitle").is_none());
        assert!(value["children"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_report_issue_count() {
        let report = IndexReport {
            missing_front_matter: vec!["a.md".into()],
            malformed_quizzes: vec![MalformedQuizEntry {
                path: "b".into(),
                question_index: 2,
                reason: "no correct option".into(),
            }],
            ..Default::default()
        };
        assert_eq!(report.issue_count(), 2);
        assert!(report.has_issues());
        assert!(!IndexReport::default().has_issues());
    }
}
