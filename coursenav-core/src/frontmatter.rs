//! Frontmatter parsing from markdown files.
//!
//! A content file starts with a `---` delimited YAML block. Some files hold
//! several chapters back to back, each with its own block:
//!
//! ```markdown
//! ---
//! title: First
//! ---
//! body one
//! ---
//! title: Second
//! ---
//! body two
//! ```
//!
//! Each block becomes its own [`ContentDocument`]. A `---` line inside a body
//! only opens a new block when every line up to the next `---` reads as a
//! `key: value` entry and at least one key is a recognized front-matter key;
//! otherwise it is left alone as a thematic break. A block that qualifies
//! but holds broken YAML is still a block of its own, reported in
//! [`ParsedFile::errors`] without costing its siblings.

use crate::models::{yaml_kind, ContentDocument, DocType, Frontmatter};
use crate::paths::{block_path, document_path, file_stem};
use coursenav_types::FieldWarning;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{location}: file does not start with a front-matter block")]
    MissingFrontMatter { location: String },

    #[error("{location}: invalid front matter: {reason}")]
    InvalidFrontMatter { location: String, reason: String },
}

impl ParseError {
    /// File (or `file#n` block) the error refers to
    pub fn location(&self) -> &str {
        match self {
            ParseError::MissingFrontMatter { location } => location,
            ParseError::InvalidFrontMatter { location, .. } => location,
        }
    }

    /// Human-readable cause without the location prefix
    pub fn reason(&self) -> String {
        match self {
            ParseError::MissingFrontMatter { .. } => "missing front matter".to_string(),
            ParseError::InvalidFrontMatter { reason, .. } => reason.clone(),
        }
    }
}

/// Documents parsed from one file, with any field-level warnings
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub documents: Vec<ContentDocument>,
    pub warnings: Vec<FieldWarning>,
    /// Blocks whose front matter could not be decoded, in block order
    pub errors: Vec<ParseError>,
}

static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static KEY_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[A-Za-z0-9\-._~%!$&'()*+,;=:@\[\]]+(?:[/?#]\S*)?$")
            .unwrap()
    })
}

fn key_line_regex() -> &'static Regex {
    KEY_LINE_REGEX.get_or_init(|| Regex::new(r"^([A-Za-z_][A-Za-z0-9_\-]*)\s*:").unwrap())
}

/// Check that a canonical URL is absolute and well formed
pub fn is_well_formed_url(raw: &str) -> bool {
    url_regex().is_match(raw.trim())
}

/// Parse every document in a file
///
/// `rel_file` is the file's path relative to the content root and decides
/// the documents' navigation paths. Only file-level problems (no leading
/// block, an unclosed first block) fail the whole file; a block with bad
/// YAML lands in [`ParsedFile::errors`] and the other blocks are kept.
///
/// # Example
///
/// ```
/// use coursenav_core::frontmatter::parse;
///
/// let content = "---\ntitle: Intro\nnav_weight: 10\n---\n# Hello\n";
///
/// let parsed = parse(content, "1/intro.md").unwrap();
/// let doc = &parsed.documents[0];
/// assert_eq!(doc.path, "1/intro");
/// assert_eq!(doc.title, "Intro");
/// assert_eq!(doc.nav_weight, Some(10));
/// assert!(doc.body.starts_with("# Hello"));
/// ```
pub fn parse(raw: &str, rel_file: &str) -> Result<ParsedFile, ParseError> {
    let content = normalize_content(raw);
    let blocks = split_blocks(&content, rel_file)?;

    let base_path = document_path(rel_file);
    let multi = blocks.len() > 1;
    let mut parsed = ParsedFile::default();

    for (index, block) in blocks.into_iter().enumerate() {
        let (path, source) = if multi {
            (block_path(&base_path, index), block_path(rel_file, index))
        } else {
            (base_path.clone(), rel_file.to_string())
        };

        let frontmatter = match decode_frontmatter(block.yaml, &source) {
            Ok(frontmatter) => frontmatter,
            Err(err) => {
                parsed.errors.push(err);
                continue;
            }
        };
        let document = build_document(
            frontmatter,
            block.body.to_string(),
            path,
            rel_file,
            index,
            source,
            &mut parsed.warnings,
        );
        parsed.documents.push(document);
    }

    Ok(parsed)
}

/// Parse only the first document of a file
pub fn parse_document(raw: &str, rel_file: &str) -> Result<ContentDocument, ParseError> {
    let mut parsed = parse(raw, rel_file)?;
    match parsed.documents.first() {
        Some(doc) if doc.block == 0 => Ok(parsed.documents.swap_remove(0)),
        // Block 0 failed, so its error heads the list
        _ => Err(parsed.errors.swap_remove(0)),
    }
}

/// Strip a UTF-8 BOM and normalize line endings to `\n`
pub fn normalize_content(content: &str) -> String {
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(content);
    content.replace("\r\n", "\n").replace('\r', "\n")
}

struct RawBlock<'a> {
    yaml: &'a str,
    body: &'a str,
}

/// A line with its byte range in the source
#[derive(Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

fn lines_with_offsets(content: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for chunk in content.split_inclusive('\n') {
        let end = start + chunk.len();
        lines.push(Line {
            text: chunk.trim_end_matches('\n'),
            start,
            end,
        });
        start = end;
    }
    lines
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn split_blocks<'a>(content: &'a str, source: &str) -> Result<Vec<RawBlock<'a>>, ParseError> {
    let lines = lines_with_offsets(content);

    match lines.first() {
        Some(first) if is_delimiter(first.text) => {}
        _ => {
            return Err(ParseError::MissingFrontMatter {
                location: source.to_string(),
            })
        }
    }

    let Some(close) = (1..lines.len()).find(|&i| is_delimiter(lines[i].text)) else {
        return Err(ParseError::InvalidFrontMatter {
            location: source.to_string(),
            reason: "front matter is not closed by a `---` line".to_string(),
        });
    };

    // (yaml start, yaml end, body start) for every block found
    let mut spans = vec![(lines[0].end, lines[close].start, lines[close].end)];
    let mut fence: Option<&'static str> = None;
    let mut i = close + 1;

    while i < lines.len() {
        let text = lines[i].text;

        if let Some(open) = fence {
            if text.trim_start().starts_with(open) {
                fence = None;
            }
            i += 1;
            continue;
        }
        if let Some(marker) = fence_marker(text) {
            fence = Some(marker);
            i += 1;
            continue;
        }

        if is_delimiter(text) {
            if let Some(next_close) = (i + 1..lines.len()).find(|&j| is_delimiter(lines[j].text)) {
                let yaml = &content[lines[i].end..lines[next_close].start];
                if looks_like_frontmatter(yaml) {
                    spans.push((lines[i].end, lines[next_close].start, lines[next_close].end));
                    i = next_close + 1;
                    continue;
                }
            }
        }
        i += 1;
    }

    let mut blocks = Vec::with_capacity(spans.len());
    for (idx, &(yaml_start, yaml_end, body_start)) in spans.iter().enumerate() {
        // The body runs up to the opening delimiter of the next block
        let body_end = match spans.get(idx + 1) {
            Some(&(next_yaml_start, _, _)) => opening_line_start(content, next_yaml_start),
            None => content.len(),
        };
        blocks.push(RawBlock {
            yaml: &content[yaml_start..yaml_end],
            body: &content[body_start..body_end],
        });
    }

    Ok(blocks)
}

/// Start offset of the `---` line that ends right before `yaml_start`
fn opening_line_start(content: &str, yaml_start: usize) -> usize {
    let before = &content[..yaml_start];
    let without_newline = before.strip_suffix('\n').unwrap_or(before);
    without_newline.rfind('\n').map(|p| p + 1).unwrap_or(0)
}

/// Decide whether a `---` fenced region inside a body is another front-matter block
fn looks_like_frontmatter(yaml: &str) -> bool {
    if yaml.trim().is_empty() {
        return false;
    }

    let mut has_known_key = false;
    for line in yaml.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') || line.starts_with("- ") {
            // Continuation of a nested value
            continue;
        }
        match key_line_regex().captures(line) {
            Some(caps) => {
                if Frontmatter::KNOWN_KEYS.contains(&&caps[1]) {
                    has_known_key = true;
                }
            }
            None => return false,
        }
    }

    has_known_key
}

fn decode_frontmatter(yaml: &str, source: &str) -> Result<Frontmatter, ParseError> {
    let invalid = |reason: String| ParseError::InvalidFrontMatter {
        location: source.to_string(),
        reason,
    };

    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| invalid(e.to_string()))?;

    match value {
        serde_yaml::Value::Null => Ok(Frontmatter::default()),
        serde_yaml::Value::Mapping(_) => {
            serde_yaml::from_value(value).map_err(|e| invalid(e.to_string()))
        }
        other => Err(invalid(format!(
            "expected a mapping, found {}",
            yaml_kind(&other)
        ))),
    }
}

fn build_document(
    frontmatter: Frontmatter,
    body: String,
    path: String,
    rel_file: &str,
    block: usize,
    source: String,
    warnings: &mut Vec<FieldWarning>,
) -> ContentDocument {
    let title = frontmatter
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| frontmatter.link_title.clone())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| file_stem(rel_file).to_string());

    let nav_weight = frontmatter
        .nav_weight
        .as_ref()
        .map(|value| match nav_weight_value(value) {
            Some(weight) => weight,
            None => {
                tracing::warn!("{}: nav_weight is not an integer, using 0", source);
                warnings.push(FieldWarning {
                    source: source.clone(),
                    code: "nav_weight.invalid".to_string(),
                    message: format!(
                        "nav_weight must be an integer, found {}; defaulting to 0",
                        describe_value(value)
                    ),
                });
                0
            }
        });

    let canonical_url = match frontmatter.canonical.as_deref().map(str::trim) {
        Some("") | None => None,
        Some(url) if is_well_formed_url(url) => Some(url.to_string()),
        Some(url) => {
            tracing::warn!("{}: ignoring malformed canonical URL {:?}", source, url);
            warnings.push(FieldWarning {
                source: source.clone(),
                code: "canonical.invalid".to_string(),
                message: format!("canonical URL {:?} is not a well-formed absolute URL", url),
            });
            None
        }
    };

    let doc_type: DocType = frontmatter
        .doc_type
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or_default();

    ContentDocument {
        path,
        file: rel_file.to_string(),
        block,
        source,
        title,
        link_title: frontmatter.link_title,
        nav_weight,
        canonical_url,
        doc_type,
        extra: frontmatter.extra,
        body,
    }
}

/// Integers, and strings holding an integer, are valid weights
fn nav_weight_value(value: &serde_yaml::Value) -> Option<i64> {
    match value {
        serde_yaml::Value::Number(n) => n.as_i64(),
        serde_yaml::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn describe_value(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => format!("{:?}", s),
        other => yaml_kind(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: "Clojure Basics"
linkTitle: "Basics"
nav_weight: 322000
canonical: "https://example.com/1/3/2/2/"
type: docs
---

# Clojure Basics

This is the content."#;

        let doc = parse_document(content, "1/3/2/2.md").unwrap();
        assert_eq!(doc.path, "1/3/2/2");
        assert_eq!(doc.source, "1/3/2/2.md");
        assert_eq!(doc.title, "Clojure Basics");
        assert_eq!(doc.link_title.as_deref(), Some("Basics"));
        assert_eq!(doc.nav_weight, Some(322000));
        assert_eq!(
            doc.canonical_url.as_deref(),
            Some("https://example.com/1/3/2/2/")
        );
        assert_eq!(doc.doc_type, DocType::Docs);
        assert!(doc.body.contains("# Clojure Basics"));
        assert!(doc.body.contains("This is the content."));
    }

    #[test]
    fn test_parse_minimal_frontmatter() {
        let content = "---\ntitle: Minimal\n---\n\nContent here.";
        let doc = parse_document(content, "minimal.md").unwrap();
        assert_eq!(doc.title, "Minimal");
        assert_eq!(doc.nav_weight, None);
        assert_eq!(doc.canonical_url, None);
        assert_eq!(doc.doc_type, DocType::Other);
        assert_eq!(doc.body, "\nContent here.");
    }

    #[test]
    fn test_missing_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        match parse(content, "plain.md") {
            Err(ParseError::MissingFrontMatter { location }) => assert_eq!(location, "plain.md"),
            other => panic!("expected MissingFrontMatter, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_frontmatter() {
        let content = "---\ntitle: Open\n\nBody without closing delimiter";
        assert!(matches!(
            parse(content, "open.md"),
            Err(ParseError::InvalidFrontMatter { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: Test\ninvalid yaml: [unclosed\n---\n\nContent.";
        let parsed = parse(content, "bad.md").unwrap();
        assert!(parsed.documents.is_empty());
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].location(), "bad.md");
        assert!(matches!(
            parsed.errors[0],
            ParseError::InvalidFrontMatter { .. }
        ));

        let err = parse_document(content, "bad.md").unwrap_err();
        assert_eq!(err.location(), "bad.md");
    }

    #[test]
    fn test_non_mapping_yaml() {
        let content = "---\n- a\n- b\n---\nBody";
        let err = parse_document(content, "list.md").unwrap_err();
        assert!(err.to_string().contains("expected a mapping"));
    }

    #[test]
    fn test_later_block_with_broken_yaml_is_reported() {
        let content = "---\ntitle: One\n---\nFirst body.\n---\ntitle: Clojure: Basics\nnav_weight: 2\n---\nSecond body.\n";

        let parsed = parse(content, "1/c.md").unwrap();
        assert_eq!(parsed.documents.len(), 1);
        let first = &parsed.documents[0];
        assert_eq!(first.path, "1/c#0");
        assert_eq!(first.title, "One");
        assert_eq!(first.body, "First body.\n");

        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].location(), "1/c.md#1");
        assert!(matches!(
            parsed.errors[0],
            ParseError::InvalidFrontMatter { .. }
        ));
    }

    #[test]
    fn test_bad_block_keeps_its_siblings() {
        let content = r#"---
title: One
---
First body.
---
title: [a, b]
---
Second body.
---
title: Three
---
Third body.
"#;

        let parsed = parse(content, "1/c.md").unwrap();
        let paths: Vec<&str> = parsed.documents.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["1/c#0", "1/c#2"]);
        assert_eq!(parsed.documents[1].title, "Three");
        assert_eq!(parsed.errors.len(), 1);
        assert_eq!(parsed.errors[0].location(), "1/c.md#1");
        assert!(parsed.errors[0].reason().contains("expected a scalar"));

        let first = parse_document(content, "1/c.md").unwrap();
        assert_eq!(first.title, "One");
    }

    #[test]
    fn test_parse_document_reports_failed_first_block() {
        let content = "---\ntitle: [a, b]\n---\nFirst.\n---\ntitle: Two\n---\nSecond.\n";
        let err = parse_document(content, "1/c.md").unwrap_err();
        assert_eq!(err.location(), "1/c.md#0");
    }

    #[test]
    fn test_empty_frontmatter_falls_back_to_file_stem() {
        let content = "---\n---\nBody";
        let doc = parse_document(content, "1/getting-started.md").unwrap();
        assert_eq!(doc.title, "getting-started");
    }

    #[test]
    fn test_title_falls_back_to_link_title() {
        let content = "---\nlinkTitle: Short\n---\nBody";
        let doc = parse_document(content, "x.md").unwrap();
        assert_eq!(doc.title, "Short");
    }

    #[test]
    fn test_non_integer_nav_weight_warns_and_defaults() {
        let content = "---\ntitle: Weighted\nnav_weight: heavy\n---\nBody";
        let parsed = parse(content, "w.md").unwrap();
        assert_eq!(parsed.documents[0].nav_weight, Some(0));
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].code, "nav_weight.invalid");
        assert_eq!(parsed.warnings[0].source, "w.md");
    }

    #[test]
    fn test_float_nav_weight_is_not_an_integer() {
        let content = "---\ntitle: Weighted\nnav_weight: 1.5\n---\nBody";
        let parsed = parse(content, "w.md").unwrap();
        assert_eq!(parsed.documents[0].nav_weight, Some(0));
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_quoted_integer_nav_weight() {
        let content = "---\ntitle: Weighted\nnav_weight: \"42\"\n---\nBody";
        let parsed = parse(content, "w.md").unwrap();
        assert_eq!(parsed.documents[0].nav_weight, Some(42));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_malformed_canonical_is_dropped() {
        let content = "---\ntitle: Link\ncanonical: not a url\n---\nBody";
        let parsed = parse(content, "c.md").unwrap();
        assert_eq!(parsed.documents[0].canonical_url, None);
        assert_eq!(parsed.warnings[0].code, "canonical.invalid");
    }

    #[test]
    fn test_url_validation() {
        assert!(is_well_formed_url("https://clojureforjava.com/1/3/2/2/"));
        assert!(is_well_formed_url("http://localhost:1313/a?b=c#d"));
        assert!(!is_well_formed_url("/relative/path"));
        assert!(!is_well_formed_url("https://"));
        assert!(!is_well_formed_url("https://exa mple.com"));
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let content = "---\ntitle: Extra\nauthor: someone\ntags: [a, b]\n---\nBody";
        let doc = parse_document(content, "e.md").unwrap();
        assert_eq!(doc.extra.len(), 2);
        assert!(doc.extra.contains_key("author"));
        assert!(doc.extra.contains_key("tags"));
    }

    #[test]
    fn test_bom_and_crlf() {
        let content = "\u{FEFF}---\r\ntitle: Windows\r\n---\r\nLine one\r\nLine two\r\n";
        let doc = parse_document(content, "win.md").unwrap();
        assert_eq!(doc.title, "Windows");
        assert_eq!(doc.body, "Line one\nLine two\n");
    }

    #[test]
    fn test_multiple_blocks_become_separate_documents() {
        let content = r#"---
title: "Chapter One"
nav_weight: 100
---
First body.
---
title: "Chapter Two"
nav_weight: 200
---
Second body.
"#;

        let parsed = parse(content, "1/3/2/2.md").unwrap();
        assert_eq!(parsed.documents.len(), 2);

        let first = &parsed.documents[0];
        let second = &parsed.documents[1];
        assert_eq!(first.path, "1/3/2/2#0");
        assert_eq!(second.path, "1/3/2/2#1");
        assert_eq!(first.source, "1/3/2/2.md#0");
        assert_eq!(second.source, "1/3/2/2.md#1");
        assert_eq!(first.title, "Chapter One");
        assert_eq!(second.title, "Chapter Two");
        assert_eq!(first.body, "First body.\n");
        assert_eq!(second.body, "Second body.\n");
        assert_eq!(first.order_key(), ("1/3/2/2.md", 0));
        assert_eq!(second.order_key(), ("1/3/2/2.md", 1));
    }

    #[test]
    fn test_thematic_break_is_not_a_new_block() {
        let content = r#"---
title: Breaks
---
Above the rule.

---

Note: this is prose, not metadata.

---

Below the rule.
"#;

        let parsed = parse(content, "breaks.md").unwrap();
        assert_eq!(parsed.documents.len(), 1);
        let doc = &parsed.documents[0];
        assert_eq!(doc.path, "breaks");
        assert!(doc.body.contains("Below the rule."));
    }

    #[test]
    fn test_delimiters_inside_code_fences_are_ignored() {
        let content = r#"---
title: Fenced
---
```yaml
---
title: Example
---
```
After the fence.
"#;

        let parsed = parse(content, "fenced.md").unwrap();
        assert_eq!(parsed.documents.len(), 1);
        assert!(parsed.documents[0].body.contains("title: Example"));
    }
}
