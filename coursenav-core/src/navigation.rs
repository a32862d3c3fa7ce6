//! Navigation tree construction.
//!
//! Documents are placed by splitting their paths on `/`. Segments without a
//! document of their own become synthetic nodes. Siblings are ordered by
//! `(nav_weight, title, path)` at every level, so the result depends only on
//! the document set and never on discovery order.

use crate::models::ContentDocument;
use crate::paths::{join, segments};
use coursenav_types::NavNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One path claimed by more than one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePath {
    pub path: String,
    pub sources: Vec<String>,
}

/// Two or more documents resolve to the same navigation path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("duplicate document path(s): {}", describe_duplicates(.duplicates))]
pub struct DuplicatePathError {
    pub duplicates: Vec<DuplicatePath>,
}

fn describe_duplicates(duplicates: &[DuplicatePath]) -> String {
    duplicates
        .iter()
        .map(|d| format!("`{}` defined by {}", d.path, d.sources.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Immutable navigation tree for one indexing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavTree {
    root: NavNode,
}

impl NavTree {
    /// Build the tree from the complete document set
    ///
    /// Fails without producing any tree when two documents share a path.
    pub fn build(documents: &[ContentDocument]) -> Result<Self, DuplicatePathError> {
        let mut ordered: Vec<&ContentDocument> = documents.iter().collect();
        ordered.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        check_duplicates(&ordered)?;

        let mut root = BuildNode::new(String::new(), String::new());
        for (insertion, doc) in ordered.iter().enumerate() {
            let weight = doc.nav_weight.unwrap_or(insertion as i64);
            let mut node = &mut root;
            for segment in segments(&doc.path) {
                let child_path = join(&node.path, segment);
                node = node
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| BuildNode::new(child_path, segment.to_string()));
            }
            node.document = Some((*doc, weight));
        }

        tracing::debug!("Built navigation tree from {} documents", ordered.len());

        Ok(Self {
            root: root.finish(),
        })
    }

    /// Wrap an already built root (e.g. one read back from JSON)
    pub fn from_root(root: NavNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &NavNode {
        &self.root
    }

    pub fn into_root(self) -> NavNode {
        self.root
    }

    pub fn find(&self, path: &str) -> Option<&NavNode> {
        self.root.find(path)
    }

    /// Number of nodes, synthetic ones and the root included
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// True when the tree holds nothing but a synthetic root
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty() && self.root.is_synthetic()
    }
}

fn check_duplicates(ordered: &[&ContentDocument]) -> Result<(), DuplicatePathError> {
    let mut by_path: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for doc in ordered {
        by_path.entry(&doc.path).or_default().push(&doc.source);
    }

    let duplicates: Vec<DuplicatePath> = by_path
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(path, sources)| DuplicatePath {
            path: path.to_string(),
            sources: sources.into_iter().map(str::to_string).collect(),
        })
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        for dup in &duplicates {
            tracing::error!("Duplicate path {}: {}", dup.path, dup.sources.join(", "));
        }
        Err(DuplicatePathError { duplicates })
    }
}

/// Mutable node used only while inserting
struct BuildNode<'a> {
    path: String,
    segment: String,
    document: Option<(&'a ContentDocument, i64)>,
    children: BTreeMap<String, BuildNode<'a>>,
}

impl<'a> BuildNode<'a> {
    fn new(path: String, segment: String) -> Self {
        Self {
            path,
            segment,
            document: None,
            children: BTreeMap::new(),
        }
    }

    fn finish(self) -> NavNode {
        let mut children: Vec<NavNode> = self.children.into_values().map(BuildNode::finish).collect();
        children.sort_by(|a, b| {
            a.nav_weight
                .cmp(&b.nav_weight)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.path.cmp(&b.path))
        });

        match self.document {
            Some((doc, weight)) => NavNode {
                path: self.path,
                title: doc.title.clone(),
                link_title: doc.link_title.clone(),
                nav_weight: weight,
                canonical_url: doc.canonical_url.clone(),
                source: Some(doc.source.clone()),
                children,
            },
            None => {
                // Synthetic nodes sort with the lightest document beneath them
                let weight = children.iter().map(|c| c.nav_weight).min().unwrap_or(0);
                let mut node = NavNode::synthetic(self.path, self.segment);
                node.nav_weight = weight;
                node.children = children;
                node
            }
        }
    }
}
