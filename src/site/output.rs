//! Output directory handling and page finalization
//!
//! After the render queue is flushed every [`Draft`] passes through [`Finalizer`]:
//!
//! 1. fragments are spliced into the draft
//! 2. article-local `.md` links are pointed at `.html` pages
//! 3. `@Keyword` references are resolved
//! 4. `articles:` and `api:` links are made relative
//! 5. links are verified against the set of pages the build writes
//! 6. the page title is taken from the first `h1`/`h2`
//! 7. headings get ids
//! 8. legacy link prefixes are rewritten
//! 9. the layout is applied and the file written with the source's modification time

use super::layout::Layout;
use super::links::{LinkVerifier, rewrite_prefixed_links};
use crate::config::LegacyLink;
use crate::markdown::RenderedFragments;
use crate::references::ReferenceMap;
use crate::render::{Draft, DraftKind, fix_article_links};
use crate::utils::{escape_html, unescape_html};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::SystemTime;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h([1-6])(\s[^>]*)?>(.*?)</h[1-6]\s*>").expect("heading pattern is valid")
});
static TITLE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[12](?:\s[^>]*)?>(.*?)</h[12]\s*>").expect("title pattern is valid"));
static ID_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\sid\s*=\s*"([^"]*)""#).expect("id attribute pattern is valid"));
static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<a\s+(?:[^>]*?\s+)?href=")([^"]*)(")"#).expect("anchor pattern is valid")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));
static ID_UNSAFE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("id pattern is valid"));
static DASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("dash pattern is valid"));
static TRAILING_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+$").expect("trailing pattern is valid"));

/// Delete `output` if it exists and create it empty.
///
/// # Errors
///
/// Returns an error if the directory cannot be removed or created.
pub fn reset_output_dir(output: &Path) -> Result<()> {
    if output.exists() {
        tracing::debug!("Output path {} already exists, deleting", output.display());
        std::fs::remove_dir_all(output)
            .with_context(|| format!("Failed to delete output directory {}", output.display()))?;
    }
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))
}

/// A written page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedPage {
    /// Output path relative to the output directory
    pub path: String,
    pub title: String,
    pub dead_links: Vec<String>,
    pub source_modified: DateTime<Utc>,
}

/// Turns drafts into finished files under the output directory.
#[derive(Debug)]
pub struct Finalizer {
    pub fragments: RenderedFragments,
    pub references: Arc<ReferenceMap>,
    pub verifier: LinkVerifier,
    pub layout: Layout,
    pub navigation: String,
    pub legacy_links: Vec<LegacyLink>,
    pub output: PathBuf,
}

impl Finalizer {
    /// Finish `draft` and write it.
    ///
    /// Dead links are returned rather than raised so they can be reported for the whole
    /// site at once.
    ///
    /// # Errors
    ///
    /// Fragment errors from splicing, [`ReferenceMap::resolve`] errors, layout errors
    /// and I/O errors.
    pub fn finalize(&self, draft: &Draft) -> Result<FinishedPage> {
        let mut html = self
            .fragments
            .splice(&draft.html, &draft.fragments)
            .with_context(|| format!("Failed to splice fragments into {}", draft.path))?;
        if draft.kind == DraftKind::Article {
            html = fix_article_links(&html);
        }

        let html = self.references.resolve(&html, &draft.path)?;
        let html = rewrite_prefixed_links(&html, &draft.path);
        let dead_links = self.verifier.dead_links(&html, &draft.path);

        let title = page_title(&html);
        let html = add_heading_ids(&html);
        let html = rewrite_legacy_links(&html, &self.legacy_links);
        let html = self.layout.apply(&html, &self.navigation, &title)?;

        let path = self.output.join(&draft.path);
        write_page(&path, &html, draft.source_modified)?;

        Ok(FinishedPage {
            path: draft.path.clone(),
            title,
            dead_links,
            source_modified: draft.source_modified,
        })
    }
}

fn write_page(path: &Path, html: &str, modified: DateTime<Utc>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;

    let file = std::fs::File::options()
        .write(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.set_modified(SystemTime::from(modified))
        .with_context(|| format!("Failed to set modification time of {}", path.display()))
}

/// Text of the first `h1` or `h2`, whitespace collapsed; empty if there is none.
#[must_use]
pub fn page_title(html: &str) -> String {
    TITLE_HEADING
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|inner| inner_text(inner.as_str()).split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Give every heading an `id`.
///
/// A non-empty existing id is kept. Otherwise the id is the lowercased heading text
/// with characters outside `[a-zA-Z0-9_-]` replaced by `-`, dash runs collapsed and
/// trailing non-alphanumerics removed. Headings whose text yields no id are left alone.
#[must_use]
pub fn add_heading_ids(html: &str) -> String {
    HEADING
        .replace_all(html, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let attributes = caps.get(2).map_or("", |m| m.as_str());

            let existing = ID_ATTRIBUTE.captures(attributes).and_then(|c| c.get(1)).map(|m| m.as_str());
            if existing.is_some_and(|id| !id.is_empty()) {
                return whole.to_string();
            }

            let id = heading_id(&caps[3]);
            if id.is_empty() {
                return whole.to_string();
            }

            let attributes = ID_ATTRIBUTE.replace_all(attributes, "");
            let opening_len = caps.get(3).map_or(0, |m| m.start()) - caps.get(0).map_or(0, |m| m.start());
            let rest = &whole[opening_len..];
            format!("<h{}{attributes} id=\"{id}\">{rest}", &caps[1])
        })
        .into_owned()
}

fn heading_id(inner: &str) -> String {
    let text = inner_text(inner).trim().to_lowercase();
    let id = ID_UNSAFE.replace_all(&text, "-");
    let id = DASHES.replace_all(&id, "-");
    TRAILING_NOISE.replace_all(&id, "").into_owned()
}

fn inner_text(html: &str) -> String {
    unescape_html(&TAG.replace_all(html, ""))
}

/// Replace configured absolute link prefixes in anchor hrefs.
#[must_use]
pub fn rewrite_legacy_links(html: &str, legacy_links: &[LegacyLink]) -> String {
    if legacy_links.is_empty() {
        return html.to_string();
    }

    ANCHOR_HREF
        .replace_all(html, |caps: &Captures<'_>| {
            let href = &caps[2];
            let rewritten = legacy_links
                .iter()
                .find_map(|link| href.strip_prefix(link.prefix.as_str()).map(|rest| format!("{}{rest}", link.replacement)));
            match rewritten {
                Some(url) => format!("{}{url}{}", &caps[1], &caps[3]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Render `sitemap.xml` for `pages`, sorted by path.
#[must_use]
pub fn sitemap(base_url: &str, pages: &[FinishedPage]) -> String {
    let mut sorted: Vec<&FinishedPage> = pages.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    for page in sorted {
        out.push_str("\t<url>\n");
        let _ = writeln!(out, "\t\t<loc>{}{}</loc>", escape_html(base_url), escape_html(&page.path));
        let _ = writeln!(out, "\t\t<lastmod>{}</lastmod>", page.source_modified.format("%Y-%m-%d"));
        out.push_str("\t\t<changefreq>daily</changefreq>\n");
        out.push_str("\t</url>\n");
    }
    out.push_str("</urlset>\n");
    out
}

/// Write `sitemap.xml` into `output`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_sitemap(output: &Path, base_url: &str, pages: &[FinishedPage]) -> Result<PathBuf> {
    let path = output.join("sitemap.xml");
    std::fs::write(&path, sitemap(base_url, pages))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::RenderQueue;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_page_title() {
        assert_eq!(page_title("<p>x</p><h2 id=\"a\">\nNode\n<span class=\"sub-title\">Fuse &amp; co</span>\n</h2><h1>Later</h1>"), "Node Fuse & co");
        assert_eq!(page_title("<H1>Intro</H1>"), "Intro");
        assert_eq!(page_title("<h3>Deep</h3>"), "");
    }

    #[test]
    fn test_add_heading_ids() {
        assert_eq!(add_heading_ids("<h1>Getting Started!</h1>"), "<h1 id=\"getting-started\">Getting Started!</h1>");
        assert_eq!(
            add_heading_ids("<h3 id=\"section-remarks\">Remarks</h3>"),
            "<h3 id=\"section-remarks\">Remarks</h3>"
        );
        assert_eq!(
            add_heading_ids("<h2 class=\"x\" id=\"\">A  <code>b</code> -- c</h2>"),
            "<h2 class=\"x\" id=\"a-b-c\">A  <code>b</code> -- c</h2>"
        );
        assert_eq!(add_heading_ids("<h4>!!!</h4>"), "<h4>!!!</h4>");
    }

    #[test]
    fn test_rewrite_legacy_links() {
        let links = vec![LegacyLink {
            prefix: "/examples/".to_string(),
            replacement: "https://examples.example.com/".to_string(),
        }];
        let html = r#"<a href="/examples/slider">a</a> <a class="c" href="/other">b</a>"#;
        assert_eq!(
            rewrite_legacy_links(html, &links),
            r#"<a href="https://examples.example.com/slider">a</a> <a class="c" href="/other">b</a>"#
        );
    }

    #[test]
    fn test_sitemap() {
        let modified = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let page = |path: &str| FinishedPage {
            path: path.to_string(),
            title: String::new(),
            dead_links: Vec::new(),
            source_modified: modified,
        };
        let xml = sitemap("https://docs.example.com/", &[page("b.html"), page("a.html")]);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
        assert!(xml.contains("\t<url>\n\t\t<loc>https://docs.example.com/a.html</loc>\n\t\t<lastmod>2024-03-09</lastmod>\n\t\t<changefreq>daily</changefreq>\n\t</url>\n"));
        assert!(xml.find("a.html").unwrap() < xml.find("b.html").unwrap());
        assert!(xml.ends_with("</urlset>\n"));
    }

    #[test]
    fn test_reset_output_dir() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out");
        std::fs::create_dir_all(output.join("stale")).unwrap();
        std::fs::write(output.join("stale/page.html"), "old").unwrap();

        reset_output_dir(&output).unwrap();
        assert!(output.is_dir());
        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_finalize_article() {
        let temp = TempDir::new().unwrap();
        let queue = RenderQueue::new();
        let body = queue.enqueue("# Guide\n\nSee @Node, [next](next.md) and [gone](gone.md).", None);
        let fragments = queue.flush().await.unwrap();

        let modified = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let draft = Draft {
            kind: DraftKind::Article,
            path: "guides/start.html".to_string(),
            html: format!("{}\n", body.placeholder),
            fragments: vec![body.id],
            source_modified: modified,
        };

        let finalizer = Finalizer {
            fragments,
            references: Arc::new(ReferenceMap::parse("Node fuse/node\n", |_| true).unwrap()),
            verifier: LinkVerifier::new(
                ["guides/next.html".to_string(), "fuse/node.html".to_string()],
                temp.path(),
            ),
            layout: Layout::from_template("<title>{{ title }}</title>{{ body }}", "/", "Docs").unwrap(),
            navigation: String::new(),
            legacy_links: Vec::new(),
            output: temp.path().to_path_buf(),
        };

        let page = finalizer.finalize(&draft).unwrap();
        assert_eq!(page.title, "Guide");
        assert_eq!(page.dead_links, vec!["gone.html"]);

        let written = temp.path().join("guides/start.html");
        let html = std::fs::read_to_string(&written).unwrap();
        assert!(html.starts_with("<title>Guide - Docs</title><h1 id=\"guide\">Guide</h1>"));
        assert!(html.contains("<a href=\"../fuse/node.html\">Node</a>"));
        assert!(html.contains("href=\"next.html\""));
        assert!(!html.contains("deferred-markdown"));

        let mtime: DateTime<Utc> = std::fs::metadata(&written).unwrap().modified().unwrap().into();
        assert_eq!(mtime, modified);
    }
}
