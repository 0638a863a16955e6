//! Anchor collection, prefixed link rewriting and dead link detection

use crate::utils::{relative_path, resolve_from};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::LazyLock;

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s+(?:[^>]*?\s+)?href="([^"]*)""#).expect("anchor href pattern is valid")
});

/// Link prefixes that name a source tree instead of a page.
const SOURCE_PREFIXES: [&str; 2] = ["articles", "api"];

/// `href` values of every `<a>` element in `html`, in document order.
#[must_use]
pub fn collect_links(html: &str) -> Vec<&str> {
    HREF.captures_iter(html).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect()
}

/// Rewrite `articles:PATH` and `api:PATH` hrefs into links relative to `current_path`.
///
/// `.md` and `.json` become `.html`, `.html` is appended when missing and a `#fragment`
/// is kept. Longer links are rewritten first so a link that prefixes another is not
/// clobbered.
#[must_use]
pub fn rewrite_prefixed_links(html: &str, current_path: &str) -> String {
    let links: BTreeSet<&str> = collect_links(html).into_iter().collect();
    let mut out = html.to_string();

    for prefix in SOURCE_PREFIXES {
        let marker = format!("{prefix}:");
        let mut matching: Vec<&str> = links.iter().copied().filter(|l| l.starts_with(&marker)).collect();
        matching.sort_by(|a, b| b.len().cmp(&a.len()));

        for link in matching {
            let relative = relative_path(current_path, &link[marker.len()..], None);
            let (path, fragment) = match relative.find('#') {
                Some(i) => relative.split_at(i),
                None => (relative.as_str(), ""),
            };

            let mut path = if let Some(stem) = path.strip_suffix(".md") {
                format!("{stem}.html")
            } else if let Some(stem) = path.strip_suffix(".json") {
                format!("{stem}.html")
            } else {
                path.to_string()
            };
            if !path.ends_with(".html") {
                path.push_str(".html");
            }

            out = out.replace(link, &format!("{path}{fragment}"));
        }
    }

    out
}

/// Checks links against the set of pages the build produces.
#[derive(Debug, Clone, Default)]
pub struct LinkVerifier {
    pages: HashSet<String>,
    output: PathBuf,
}

impl LinkVerifier {
    /// `pages` are output paths relative to `output`; files already on disk under
    /// `output` also count as valid targets.
    #[must_use]
    pub fn new(pages: impl IntoIterator<Item = String>, output: impl Into<PathBuf>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            output: output.into(),
        }
    }

    /// Dead links of the page at `current_path`, in document order.
    #[must_use]
    pub fn dead_links(&self, html: &str, current_path: &str) -> Vec<String> {
        collect_links(html)
            .into_iter()
            .filter(|href| !self.is_valid(href, current_path))
            .map(str::to_string)
            .collect()
    }

    fn is_valid(&self, href: &str, current_path: &str) -> bool {
        if href.starts_with('#') || href.starts_with('/') {
            return true;
        }
        if ["file://", "http://", "https://", "mailto:"].iter().any(|scheme| href.starts_with(scheme)) {
            return true;
        }

        let path = href.split_once('#').map_or(href, |(path, _)| path);
        let Some(target) = resolve_from(current_path, path) else {
            return false;
        };
        if target.is_empty() {
            return false;
        }
        self.pages.contains(&target) || self.output.join(&target).is_file()
    }
}
