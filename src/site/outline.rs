//! Site navigation built from the `outline` file
//!
//! Each non-blank line that does not start with `//` has the form `title : link`. Depth
//! is the number of leading tabs plus one; spaces are not accepted as indentation.
//! Links point at source files and are mapped to output pages:
//!
//! - `articles/X.md` becomes `X.html`
//! - `api-docs/X.json` becomes `X.html`, with `api/index.html` renamed to
//!   `api/root-ns.html` and the leading `api/` then stripped
//!
//! The result is a nested `<ul>`/`<li>` list with every opened element closed.

use crate::config::BuilderSettings;
use crate::core::DocError;
use crate::utils::escape_html;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Read and render the outline of `settings.root`.
///
/// # Errors
///
/// Returns [`DocError::SourceFileNotFound`] if there is no outline file, and any error
/// of [`build_outline`].
pub fn load_outline(settings: &BuilderSettings) -> Result<String> {
    let path = settings.outline_path();
    if !path.is_file() {
        return Err(DocError::SourceFileNotFound {
            what: "outline".to_string(),
            path: path.display().to_string(),
        }
        .into());
    }

    let started = std::time::Instant::now();
    tracing::debug!("Building outline from '{}'", path.display());
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read outline {}", path.display()))?;
    let outline = build_outline(&text, &settings.root, &settings.base_url)?;
    tracing::debug!("Outline built in {:?}", started.elapsed());
    Ok(outline)
}

/// Render outline `text`, checking every link against files under `root`.
///
/// # Errors
///
/// - [`DocError::MalformedOutline`] for lines that are not `title : link`, indented
///   with spaces, or linking to anything but an article or API document
/// - [`DocError::OutlineTargetNotFound`] if a linked file does not exist
/// - [`DocError::DuplicateOutlineLink`] if two lines link to the same page
pub fn build_outline(text: &str, root: &Path, base_url: &str) -> Result<String> {
    let mut state = OutlineState::default();

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        state.process(line, index + 1, root, base_url)?;
    }
    state.decorate(0);

    Ok(state.out)
}

#[derive(Default)]
struct OutlineState {
    previous_depth: usize,
    seen: HashMap<String, usize>,
    out: String,
}

impl OutlineState {
    fn process(&mut self, line: &str, number: usize, root: &Path, base_url: &str) -> Result<()> {
        let malformed = |reason: &str| DocError::MalformedOutline {
            line: number,
            reason: reason.to_string(),
            content: line.to_string(),
        };

        let parts: Vec<&str> = line.split(" : ").collect();
        let [title, link] = parts.as_slice() else {
            return Err(malformed("expected 'title : link'").into());
        };
        let (title, link) = (title.trim(), link.trim());

        let depth = depth_of(line).ok_or_else(|| malformed("mixed tabs and spaces"))?;
        self.decorate(depth);

        let target = root.join(link);
        if !target.is_file() {
            return Err(DocError::OutlineTargetNotFound {
                line: number,
                path: target.display().to_string(),
            }
            .into());
        }

        let mut href = output_href(link).ok_or_else(|| malformed("link must be articles/*.md or api-docs/*.json"))?;
        if let Some(&previous_line) = self.seen.get(&href) {
            return Err(DocError::DuplicateOutlineLink {
                href,
                line: number,
                previous_line,
            }
            .into());
        }
        self.seen.insert(href.clone(), number);

        if href == "api/index.html" {
            href = "api/root-ns.html".to_string();
        }
        let lower = href.to_lowercase();
        if lower.starts_with("api/") && lower.ends_with(".html") {
            href = href[4..].to_string();
        }

        self.push(
            depth + 1,
            &format!("<a href=\"{base_url}{}\">{}</a>", escape_html(&href), escape_html(title)),
        );
        self.previous_depth = depth;
        Ok(())
    }

    /// Open or close list levels to move from the previous depth to `depth`.
    fn decorate(&mut self, depth: usize) {
        let previous = self.previous_depth;

        if previous != 0 && previous == depth {
            self.push(previous, "</li>");
        }

        if previous < depth {
            for level in previous..depth {
                self.push(level, &format!("<ul class=\"list-unstyled outline-nav outline-nav-level-{level}\">"));
                self.push(level + 1, "<li>");
            }
        } else if previous > depth {
            for level in (depth..=previous).rev() {
                if level != 0 {
                    self.push(level, "</li>");
                }
                if level != depth {
                    self.push(level - 1, "</ul>");
                }
            }
            if depth != 0 {
                self.push(depth, "<li>");
            }
        }

        if previous == depth && depth != 0 {
            self.push(depth, "<li>");
        }
    }

    fn push(&mut self, indent: usize, text: &str) {
        for _ in 0..indent {
            self.out.push('\t');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

/// Leading tabs plus one, or `None` if a space appears before the content.
fn depth_of(line: &str) -> Option<usize> {
    let mut tabs = 0;
    for c in line.chars() {
        match c {
            '\t' => tabs += 1,
            ' ' => return None,
            _ => break,
        }
    }
    Some(tabs + 1)
}

/// Output page of an outline link.
fn output_href(link: &str) -> Option<String> {
    let lower = link.to_lowercase();
    if let Some(rest) = link.strip_prefix("articles/").filter(|_| lower.ends_with(".md")) {
        return Some(format!("{}.html", &rest[..rest.len() - 3]));
    }
    if let Some(rest) = link.strip_prefix("api-docs/").filter(|_| lower.ends_with(".json")) {
        return Some(format!("{}.html", &rest[..rest.len() - 5]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture(files: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for file in files {
            let path = temp.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "").unwrap();
        }
        temp
    }

    #[test]
    fn test_nested_levels_are_balanced() {
        let root = fixture(&["articles/a.md", "articles/b.md", "articles/c.md", "articles/d.md"]);
        let text = "A : articles/a.md\n\tB : articles/b.md\n\t\tC : articles/c.md\nD : articles/d.md\n";
        let html = build_outline(text, root.path(), "/docs/").unwrap();

        assert_eq!(html.matches("<ul").count(), 3);
        assert_eq!(html.matches("</ul>").count(), 3);
        assert_eq!(html.matches("<li>").count(), 4);
        assert_eq!(html.matches("</li>").count(), 4);
        assert!(html.starts_with("<ul class=\"list-unstyled outline-nav outline-nav-level-0\">\n\t<li>\n"));
        assert!(html.contains("\t\t\t\t<a href=\"/docs/c.html\">C</a>\n"));
        assert!(html.contains("outline-nav-level-2"));
    }

    #[test]
    fn test_siblings_and_comments() {
        let root = fixture(&["articles/a.md", "articles/b.md"]);
        let text = "// navigation\nA : articles/a.md\n\n   \nB & co : articles/b.md\n";
        let html = build_outline(text, root.path(), "/").unwrap();

        assert_eq!(
            html,
            "<ul class=\"list-unstyled outline-nav outline-nav-level-0\">\n\t<li>\n\t\t<a href=\"/a.html\">A</a>\n\t</li>\n\t<li>\n\t\t<a href=\"/b.html\">B &amp; co</a>\n\t</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_outline_without_entries_is_empty() {
        let root = fixture(&[]);

        assert_eq!(build_outline("// nothing yet\n\n", root.path(), "/").unwrap(), "");
        assert_eq!(build_outline("", root.path(), "/").unwrap(), "");
    }

    #[test]
    fn test_api_links() {
        let root = fixture(&["api-docs/api/index.json", "api-docs/api/fuse/node.json"]);
        let text = "API : api-docs/api/index.json\n\tNode : api-docs/api/fuse/node.json\n";
        let html = build_outline(text, root.path(), "/").unwrap();

        assert!(html.contains("<a href=\"/root-ns.html\">API</a>"));
        assert!(html.contains("<a href=\"/fuse/node.html\">Node</a>"));
    }

    #[test]
    fn test_malformed_lines() {
        let root = fixture(&["articles/a.md", "static/a.png"]);

        let err = build_outline("just a title\n", root.path(), "/").unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MalformedOutline { line: 1, .. })));

        let err = build_outline("A : articles/a.md\n  B : articles/a.md\n", root.path(), "/").unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MalformedOutline { line: 2, .. })));

        let err = build_outline("A : static/a.png\n", root.path(), "/").unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MalformedOutline { .. })));
    }

    #[test]
    fn test_missing_target() {
        let root = fixture(&[]);
        let err = build_outline("A : articles/a.md\n", root.path(), "/").unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::OutlineTargetNotFound { line: 1, .. })));
    }

    #[test]
    fn test_duplicate_link_names_both_lines() {
        let root = fixture(&["articles/a.md"]);
        let err = build_outline("A : articles/a.md\n// x\nAgain : articles/a.md\n", root.path(), "/").unwrap_err();
        match err.downcast_ref::<DocError>() {
            Some(DocError::DuplicateOutlineLink { href, line, previous_line }) => {
                assert_eq!(href, "a.html");
                assert_eq!(*line, 3);
                assert_eq!(*previous_line, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
