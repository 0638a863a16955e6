//! Markdown conversion and deferred rendering
//!
//! All Markdown in docweave (article bodies, entity comments, briefs, parameter docs)
//! is converted by [`to_html`], using pulldown-cmark with tables, strikethrough and
//! footnotes enabled. Raw HTML passes through untouched, which is what lets drafters
//! embed placeholder tags and hand-written markup in Markdown sources.
//!
//! Conversion is normally not called directly. Drafters enqueue fragments on a
//! [`RenderQueue`] and the builder converts them in one batch; see [`deferred`] for the
//! draft, flush and splice protocol.
//!
//! # Post-processing
//!
//! A fragment may carry an [`HtmlPostProcessor`] that runs on its HTML right after
//! conversion. [`ShiftHeadings`] is used for comments embedded in API pages.

pub mod deferred;
pub mod post_process;

pub use deferred::{Deferred, FragmentId, RenderQueue, RenderedFragments};
pub use post_process::{HtmlPostProcessor, ShiftHeadings};

use anyhow::{Context, Result};
use pulldown_cmark::{Options, Parser, html};
use std::path::{Path, PathBuf};

/// Convert Markdown to HTML.
#[must_use]
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Whether `path` names an article source (`.md`, any case).
#[must_use]
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Recursively list article sources under `dir`, sorted by path.
///
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if any directory entry cannot be read.
pub fn list_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }

    for entry in walkdir::WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to walk articles in {}", dir.display()))?;
        if entry.file_type().is_file() && is_markdown_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
