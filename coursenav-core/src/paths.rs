//! Document path derivation and normalization.

use std::path::Path;

/// File stems that stand for their enclosing section rather than a page
const SECTION_INDEX_STEMS: [&str; 2] = ["_index", "index"];

const MARKDOWN_EXTENSION: &str = "md";

/// True for files with a markdown extension, in any letter case
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
}

/// Drop a trailing `.md` (any case) from a file name or path
fn strip_markdown_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.eq_ignore_ascii_case(MARKDOWN_EXTENSION) => stem,
        _ => name,
    }
}

/// Render a relative filesystem path with `/` separators
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use coursenav_core::paths::to_slash_path;
///
/// assert_eq!(to_slash_path(Path::new("1/3/intro.md")), "1/3/intro.md");
/// ```
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive the navigation path of a content file
///
/// Rules:
/// - Backslashes become `/`
/// - The `.md` extension is dropped
/// - A trailing `_index` or `index` segment is dropped, so a section's
///   index file takes the section's own path
/// - Empty segments are removed
///
/// # Examples
///
/// ```
/// use coursenav_core::document_path;
///
/// assert_eq!(document_path("1/3/2/2.md"), "1/3/2/2");
/// assert_eq!(document_path("1/3/_index.md"), "1/3");
/// assert_eq!(document_path("_index.md"), "");
/// ```
pub fn document_path(rel_file: &str) -> String {
    let normalized = rel_file.replace('\\', "/");
    let without_ext = strip_markdown_extension(&normalized);

    let mut parts: Vec<&str> = segments(without_ext).collect();
    if parts
        .last()
        .is_some_and(|last| SECTION_INDEX_STEMS.contains(last))
    {
        parts.pop();
    }

    parts.join("/")
}

/// Append a block suffix for files holding several documents
pub fn block_path(base: &str, block: usize) -> String {
    format!("{}#{}", base, block)
}

/// Non-empty `/`-separated segments of a path
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Join a parent path and a segment
pub fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", parent, segment)
    }
}

/// File stem of a relative file path (`1/3/intro.md` -> `intro`)
pub fn file_stem(rel_file: &str) -> &str {
    let name = rel_file.rsplit(['/', '\\']).next().unwrap_or(rel_file);
    strip_markdown_extension(name)
}
