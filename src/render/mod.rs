//! HTML drafting of API documents and articles
//!
//! Rendering produces [`Draft`]s: page HTML in which every piece of Markdown is still
//! a placeholder, plus the ordered list of fragment ids the page produced. The builder
//! drafts every page concurrently, flushes the shared [`RenderQueue`], then hands each
//! draft to [`site`](crate::site) for splicing and post-processing.
//!
//! # Modules
//!
//! - [`titles`] - per-kind title rules and advanced classification
//! - [`toc_item`] - one table-of-contents row
//! - [`document`] - a complete API page
//! - [`index`] - `[subclass ...]` descendant listings
//! - [`article`] - Markdown articles
//!
//! Everything here is synchronous. Renderers only enqueue Markdown, so they are cheap
//! to run on the blocking pool and never wait on each other.

pub mod article;
pub mod document;
pub mod index;
pub mod titles;
pub mod toc_item;

pub use article::{fix_article_links, render_article};
pub use document::{api_output_path, render_document};
pub use index::SubclassIndex;

use crate::markdown::{FragmentId, HtmlPostProcessor, RenderQueue};
use crate::models::{ApiDocument, Entity};
use crate::references::ReferenceMap;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// All API documents of a build, addressable by entity id and by href.
#[derive(Debug, Default)]
pub struct EntityCache {
    documents: Vec<ApiDocument>,
    by_id: HashMap<String, usize>,
    by_href: HashMap<String, usize>,
}

impl EntityCache {
    /// Index `documents`. On duplicate ids or hrefs the first document wins.
    #[must_use]
    pub fn new(documents: Vec<ApiDocument>) -> Self {
        let mut by_id = HashMap::with_capacity(documents.len());
        let mut by_href = HashMap::with_capacity(documents.len());

        for (index, document) in documents.iter().enumerate() {
            let entity = &document.entity;
            if by_id.contains_key(&entity.id.id) {
                tracing::warn!("Duplicate API entity id '{}', keeping the first", entity.id.id);
            } else {
                by_id.insert(entity.id.id.clone(), index);
            }
            by_href.entry(entity.uri.href.clone()).or_insert(index);
        }

        Self {
            documents,
            by_id,
            by_href,
        }
    }

    #[must_use]
    pub fn documents(&self) -> &[ApiDocument] {
        &self.documents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Entity by raw id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.by_id.get(id).map(|&i| &self.documents[i].entity)
    }

    /// Entity by href.
    #[must_use]
    pub fn get_by_href(&self, href: &str) -> Option<&Entity> {
        self.by_href.get(href).map(|&i| &self.documents[i].entity)
    }
}

/// Shared services every renderer needs.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub queue: Arc<RenderQueue>,
    pub entities: Arc<EntityCache>,
    pub indices: Arc<SubclassIndex>,
    pub references: Arc<ReferenceMap>,
}

/// What a draft was rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    Article,
    ApiDocument,
}

/// A rendered page still holding fragment placeholders.
#[derive(Debug, Clone)]
pub struct Draft {
    pub kind: DraftKind,
    /// Output path relative to the output directory, `/` separated
    pub path: String,
    pub html: String,
    /// Fragment ids in production order
    pub fragments: Vec<FragmentId>,
    pub source_modified: DateTime<Utc>,
}

/// HTML produced by a renderer together with the fragments it enqueued.
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub fragments: Vec<FragmentId>,
}

/// Line oriented HTML builder that tracks enqueued fragments.
///
/// Every [`line`](Self::line) is terminated with `\n`.
pub(crate) struct PageWriter<'a> {
    queue: &'a RenderQueue,
    out: String,
    fragments: Vec<FragmentId>,
}

impl<'a> PageWriter<'a> {
    pub(crate) fn new(queue: &'a RenderQueue) -> Self {
        Self {
            queue,
            out: String::new(),
            fragments: Vec::new(),
        }
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    /// Enqueue `markdown` and write its placeholder as a line.
    pub(crate) fn markdown(
        &mut self,
        markdown: impl Into<String>,
        post_processor: Option<Arc<dyn HtmlPostProcessor>>,
    ) {
        let deferred = self.queue.enqueue(markdown, post_processor);
        self.fragments.push(deferred.id);
        self.line(deferred.placeholder);
    }

    /// Append output of a nested renderer, keeping its fragments in order.
    pub(crate) fn append(&mut self, rendered: Rendered) {
        self.out.push_str(&rendered.html);
        self.fragments.extend(rendered.fragments);
    }

    /// Record fragments produced while preparing Markdown that is enqueued later.
    pub(crate) fn adopt(&mut self, fragments: Vec<FragmentId>) {
        self.fragments.extend(fragments);
    }

    pub(crate) fn finish(self) -> Rendered {
        Rendered {
            html: self.out,
            fragments: self.fragments,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::{EntityId, EntityUri, Titles};

    pub fn entity(id: &str, kind: &str, href: &str, index_title: &str) -> Entity {
        Entity {
            id: EntityId {
                id: id.to_string(),
                kind: kind.to_string(),
                ..EntityId::default()
            },
            uri: EntityUri {
                href: href.to_string(),
                id_uri: Some(href.to_string()),
            },
            titles: Titles {
                page_title: format!("{index_title} {kind}"),
                index_title: index_title.to_string(),
                fully_qualified_index_title: id.to_string(),
                ..Titles::default()
            },
            ..Entity::default()
        }
    }

    pub fn document(entity: Entity) -> ApiDocument {
        ApiDocument {
            entity,
            ..ApiDocument::default()
        }
    }

    pub fn context(entities: Vec<Entity>) -> RenderContext {
        RenderContext {
            queue: Arc::new(RenderQueue::new()),
            entities: Arc::new(EntityCache::new(entities.into_iter().map(document).collect())),
            indices: Arc::new(SubclassIndex::default()),
            references: Arc::new(ReferenceMap::parse("", |_| true).unwrap()),
        }
    }
}
