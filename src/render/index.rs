//! `[subclass ...]` embedding
//!
//! Articles and comments may contain `[subclass Fuse.Elements.Element]` tags. Each tag
//! is replaced by a listing of the non-abstract descendants of that type, built from
//! the descendant indices under `api-docs/indices`. Tags naming a type without an index
//! are removed with a warning.

use super::toc_item::render_toc_item;
use super::titles::is_advanced;
use super::{EntityCache, Rendered};
use crate::markdown::RenderQueue;
use crate::models::{ApiIndex, TocItem, sort_by_index_title};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static SUBCLASS_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[subclass ([\w.]+)\]").expect("subclass tag pattern is valid")
});

/// Descendant indices keyed by the href of their root type.
#[derive(Debug, Default)]
pub struct SubclassIndex {
    by_href: HashMap<String, ApiIndex>,
}

impl SubclassIndex {
    #[must_use]
    pub fn new(indices: Vec<ApiIndex>) -> Self {
        let by_href = indices.into_iter().map(|index| (index.root.uri.href.clone(), index)).collect();
        Self {
            by_href,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_href.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_href.is_empty()
    }

    /// Replace every `[subclass ...]` tag in `markdown` with its descendant listing.
    ///
    /// The returned HTML is still Markdown source; its fragments are the briefs of the
    /// listed descendants, in production order.
    ///
    /// # Errors
    ///
    /// Returns an error if a descendant row cannot be rendered.
    pub fn embed(
        &self,
        markdown: &str,
        current_path: &str,
        cache: &EntityCache,
        queue: &RenderQueue,
    ) -> Result<Rendered> {
        if !markdown.contains('[') {
            return Ok(Rendered {
                html: markdown.to_string(),
                fragments: Vec::new(),
            });
        }

        let mut out = String::with_capacity(markdown.len());
        let mut fragments = Vec::new();
        let mut last = 0;

        for captures in SUBCLASS_TAG.captures_iter(markdown) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            out.push_str(&markdown[last..whole.start()]);
            last = whole.end();

            if let Some(listing) = self.render_listing(name.as_str(), current_path, cache, queue)? {
                out.push_str(&listing.html);
                fragments.extend(listing.fragments);
            }
        }
        out.push_str(&markdown[last..]);

        Ok(Rendered {
            html: out,
            fragments,
        })
    }

    fn render_listing(
        &self,
        type_name: &str,
        current_path: &str,
        cache: &EntityCache,
        queue: &RenderQueue,
    ) -> Result<Option<Rendered>> {
        let href = type_name.to_lowercase().replace('.', "/");
        let Some(index) = self.by_href.get(&href) else {
            tracing::warn!("Unable to find API index for {} - ignoring", href);
            return Ok(None);
        };

        let mut items: Vec<TocItem> = index
            .descendants
            .iter()
            .filter(|item| !item.id.modifiers.iter().any(|m| m == "abstract"))
            .cloned()
            .collect();
        sort_by_index_title(&mut items);

        let mut html = String::from(
            "<section class=\"table-of-contents\">\n<section class=\"table-of-contents-section\">\n",
        );
        let mut fragments = Vec::new();
        for item in &items {
            let row = render_toc_item(item, cache, queue, current_path, is_advanced(item, None))?;
            html.push_str(&row.rendered.html);
            fragments.extend(row.rendered.fragments);
        }
        html.push_str("</section>\n</section>\n");

        Ok(Some(Rendered {
            html,
            fragments,
        }))
    }
}
