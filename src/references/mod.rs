//! Keyword cross-reference resolution
//!
//! Authors link to other pages with short sigil references instead of paths:
//!
//! - `@Keyword` - bare reference
//! - `@(Keyword)` - legacy parenthesized reference
//! - `@(Keyword:display title)` - legacy reference with an alias title
//!
//! The [`ReferenceMap`] is loaded from the `reference-map` file (`keyword target` per
//! line) and rewrites every occurrence in rendered HTML into an anchor pointing at the
//! target page, relative to the page being resolved. Unknown keywords are replaced by
//! their title text and recorded so the build can report them.
//!
//! # Resolution Rules
//!
//! - Known keywords are tried longest first, so `@Fuse.Node` wins over `@Fuse`.
//! - Matches are rewritten one at a time, leftmost first, and the text is scanned again
//!   from the start after every rewrite.
//! - A match inside an HTML `<code>` element is never rewritten. Its sigil is swapped for
//!   a private-use character during the scan and restored afterwards.
//! - At most [`MAX_REPLACEMENTS`] rewrites are performed per document; more than that
//!   means a reference keeps reproducing itself and the build fails with
//!   [`DocError::ReferenceLoop`].
//!
//! # Examples
//!
//! ```rust
//! use docweave::references::ReferenceMap;
//!
//! # fn example() -> anyhow::Result<()> {
//! let map = ReferenceMap::parse("Node fuse/node\n", |_| true)?;
//!
//! let html = map.resolve("<p>See @Node and @Missing.</p>", "articles/intro.html")?;
//! assert_eq!(html, "<p>See <a href=\"../fuse/node.html\">Node</a> and Missing.</p>");
//! assert!(map.unresolved().contains_key("@Missing"));
//! # Ok(())
//! # }
//! ```

use crate::config::BuilderSettings;
use crate::core::DocError;
use crate::utils::{escape_html, relative_path};
use anyhow::{Context, Result};
use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;
use strsim::levenshtein;

/// Upper bound on rewrites performed by a single [`ReferenceMap::resolve`] call.
pub const MAX_REPLACEMENTS: usize = 10_000;

/// Candidates for the character standing in for `@` inside code elements while a
/// document is being resolved. The first one absent from the document is used.
const NEUTRAL_SIGILS: RangeInclusive<char> = '\u{E000}'..='\u{F8FF}';

/// Maximum edit distance, as a percentage of keyword length, for suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Catch-all alternatives matching references to keywords the map does not know.
const FALLBACK_PATTERNS: [&str; 3] =
    [r"@([a-zA-Z0-9_]+)", r"@(\([a-zA-Z0-9_]+\))", r"@(\([a-zA-Z0-9_]+:(.+?)\))"];

/// Keyword to document lookup with a shared record of failed lookups.
///
/// The map is immutable after loading; [`resolve`](Self::resolve) takes `&self` and may
/// be called from many threads at once. Failed lookups from all documents are merged
/// into one concurrent tracker.
#[derive(Debug)]
pub struct ReferenceMap {
    lookups: HashMap<String, String>,
    pattern: Regex,
    failed: DashMap<String, BTreeSet<String>>,
}

impl ReferenceMap {
    /// Load and validate `<root>/reference-map`.
    ///
    /// Every target must exist as `articles/<target>.md` or `api-docs/api/<target>.json`.
    ///
    /// # Errors
    ///
    /// - [`DocError::SourceFileNotFound`] if the file is missing
    /// - [`DocError::MalformedReferenceMap`] for a line that is not `keyword target`
    /// - [`DocError::UnresolvableReference`] for a target with no source file
    pub fn load(settings: &BuilderSettings) -> Result<Self> {
        let path = settings.reference_map_path();
        if !path.is_file() {
            return Err(DocError::SourceFileNotFound {
                what: "reference map".to_string(),
                path: path.display().to_string(),
            }
            .into());
        }

        tracing::debug!("Parsing reference map at '{}'", path.display());
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read reference map: {}", path.display()))?;

        let articles = settings.articles_dir();
        let api = settings.api_dir();
        let map = Self::parse(&text, |target| {
            articles.join(format!("{target}.md")).is_file()
                || api.join(format!("{target}.json")).is_file()
        })?;

        tracing::debug!("{} entries read from reference map", map.len());
        Ok(map)
    }

    /// Parse mapping text, using `target_exists` to validate every target.
    ///
    /// Lines are trimmed; blank lines and lines starting with `//` are skipped. The
    /// keyword and target are separated by the first run of whitespace. A repeated
    /// keyword is logged and ignored, keeping the first mapping.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn parse(text: &str, target_exists: impl Fn(&str) -> bool) -> Result<Self> {
        let mut lookups = HashMap::new();
        // File order, for a stable tie-break between keywords of equal length
        let mut keywords: Vec<String> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let line_number = index + 1;

            let mut parts = line.splitn(2, char::is_whitespace);
            let (Some(keyword), Some(rest)) = (parts.next(), parts.next()) else {
                return Err(DocError::MalformedReferenceMap {
                    line: line_number,
                    content: line.to_string(),
                }
                .into());
            };
            let target = rest.trim_start();
            if target.is_empty() {
                return Err(DocError::MalformedReferenceMap {
                    line: line_number,
                    content: line.to_string(),
                }
                .into());
            }

            if lookups.contains_key(keyword) {
                tracing::warn!("Duplicate reference map entry on line {}: {}", line_number, line);
                continue;
            }

            if !target_exists(target) {
                return Err(DocError::UnresolvableReference {
                    target: target.to_string(),
                    line: line_number,
                }
                .into());
            }

            lookups.insert(keyword.to_string(), target.to_string());
            keywords.push(keyword.to_string());
        }

        let pattern = build_pattern(keywords)?;
        Ok(Self {
            lookups,
            pattern,
            failed: DashMap::new(),
        })
    }

    /// Target document path for `keyword`.
    #[must_use]
    pub fn target(&self, keyword: &str) -> Option<&str> {
        self.lookups.get(keyword).map(String::as_str)
    }

    /// Number of keywords in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }

    /// Rewrite every reference in `text`, as seen from the output page `current_path`.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::ReferenceLoop`] if more than [`MAX_REPLACEMENTS`] rewrites are
    /// needed.
    pub fn resolve(&self, text: &str, current_path: &str) -> Result<String> {
        let Some(sigil) = NEUTRAL_SIGILS.find(|c| !text.contains(*c)) else {
            anyhow::bail!("No free character left to mask code references in '{current_path}'");
        };
        let mut text = text.to_string();
        let mut neutralized = false;
        let mut replacements = 0usize;

        while let Some(found) = self.pattern.find(&text) {
            let (start, end) = (found.start(), found.end());

            if is_within_code(&text, start) {
                // '@' is a single byte, so the range is exact
                text.replace_range(start..start + 1, sigil.encode_utf8(&mut [0; 4]));
                neutralized = true;
                continue;
            }

            replacements += 1;
            if replacements > MAX_REPLACEMENTS {
                return Err(DocError::ReferenceLoop {
                    path: current_path.to_string(),
                    iterations: MAX_REPLACEMENTS,
                }
                .into());
            }

            let exact = found.as_str().to_string();
            let (keyword, title) = split_reference(&exact);

            let replacement = match self.lookups.get(keyword) {
                Some(target) => format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(&relative_path(current_path, target, Some("html"))),
                    escape_html(title)
                ),
                None => {
                    self.failed.entry(exact.clone()).or_default().insert(current_path.to_string());
                    escape_html(title)
                }
            };

            text.replace_range(start..end, &replacement);
        }

        if neutralized {
            text = text.replace(sigil, "@");
        }

        Ok(text)
    }

    /// Sorted snapshot of failed lookups: matched text to the pages it appeared in.
    #[must_use]
    pub fn unresolved(&self) -> BTreeMap<String, Vec<String>> {
        self.failed
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().iter().cloned().collect()))
            .collect()
    }

    /// Closest known keyword to `reference` (with or without sigil and parentheses).
    #[must_use]
    pub fn suggest(&self, reference: &str) -> Option<&str> {
        let (keyword, _) = split_reference(reference);
        let limit = keyword.len() * SIMILARITY_THRESHOLD_PERCENT / 100;

        self.lookups
            .keys()
            .map(|known| (known, levenshtein(keyword, known)))
            .filter(|(_, distance)| *distance > 0 && *distance <= limit)
            .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(known, _)| known.as_str())
    }
}

/// Build the combined alternation: per keyword (longest first) the bare, legacy and
/// aliased forms, followed by the catch-alls.
fn build_pattern(mut keywords: Vec<String>) -> Result<Regex> {
    keywords.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut alternatives: Vec<String> = Vec::with_capacity(keywords.len() * 3 + 3);
    for keyword in &keywords {
        let escaped = regex::escape(keyword);
        alternatives.push(format!(r"@{escaped}"));
        alternatives.push(format!(r"@\({escaped}\)"));
        alternatives.push(format!(r"@\({escaped}:(.+?)\)"));
    }
    alternatives.extend(FALLBACK_PATTERNS.iter().map(|p| (*p).to_string()));

    let pattern = RegexBuilder::new(&alternatives.join("|"))
        .size_limit(1 << 28)
        .dfa_size_limit(1 << 28)
        .build()
        .context("Failed to compile reference map pattern")?;
    Ok(pattern)
}

/// Split a matched reference into lookup keyword and display title.
fn split_reference(exact: &str) -> (&str, &str) {
    let body = exact.trim_start_matches('@');
    match body.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
        Some(inner) => inner.split_once(':').unwrap_or((inner, inner)),
        None => (body, body),
    }
}

/// Whether byte offset `index` lies inside a `<code ...>...</code>` element.
///
/// The nearest code tag before `index` decides: an opener means inside, a closer means
/// outside. An opener with no closer yet counts as inside.
fn is_within_code(text: &str, index: usize) -> bool {
    let before = &text[..index];
    match (before.rfind("<code"), before.rfind("</code")) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}
