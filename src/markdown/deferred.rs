//! Deferred Markdown rendering
//!
//! Drafting a page produces many small Markdown fragments (comments, briefs, parameter
//! docs). Instead of converting each one inline, drafters enqueue them on a shared
//! [`RenderQueue`] and write an inert placeholder tag into their HTML. Once every draft
//! exists, the queue is flushed in one parallel batch and each draft splices the
//! converted HTML back in place of its placeholders.
//!
//! The two phases are separate types: a [`RenderQueue`] can only be enqueued into, and
//! [`RenderedFragments`] can only be spliced from. `flush` consumes the queue, so a
//! fragment cannot be enqueued after conversion started, and nothing can be spliced
//! before it finished.
//!
//! # Nesting
//!
//! A fragment's source may itself contain placeholders of other fragments, e.g. an
//! article embedding a subclass listing whose briefs are fragments. Placeholders are
//! valid CommonMark raw HTML, so they survive conversion untouched. When splicing, each
//! listed fragment's HTML is expanded with the other listed fragments before insertion,
//! so the result holds no placeholder of a listed id whichever order they were produced
//! in.
//!
//! # Examples
//!
//! ```rust
//! use docweave::markdown::RenderQueue;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let queue = RenderQueue::new();
//! let brief = queue.enqueue("**bold**", None);
//! let host = format!("<div>{}</div>", brief.placeholder);
//!
//! let rendered = queue.flush().await?;
//! let html = rendered.splice(&host, &[brief.id])?;
//! assert_eq!(html, "<div><p><strong>bold</strong></p>\n</div>");
//! # Ok(())
//! # }
//! ```

use super::{HtmlPostProcessor, to_html};
use crate::core::DocError;
use crate::utils::map_blocking;
use anyhow::Result;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Tag prefix shared by every placeholder.
const PLACEHOLDER_PREFIX: &str = "<deferred-markdown-";

/// Opaque identifier of one deferred fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(Uuid);

impl FragmentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Placeholder tag standing in for this fragment.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("{PLACEHOLDER_PREFIX}{}/>", self.0.simple())
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Handle returned by [`RenderQueue::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub id: FragmentId,
    /// Inert tag to write into the draft where the fragment belongs
    pub placeholder: String,
}

struct PendingFragment {
    markdown: String,
    post_processor: Option<Arc<dyn HtmlPostProcessor>>,
}

impl fmt::Debug for PendingFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFragment")
            .field("markdown_len", &self.markdown.len())
            .field("post_processor", &self.post_processor)
            .finish()
    }
}

/// Draft-phase queue of Markdown fragments awaiting conversion.
#[derive(Debug, Default)]
pub struct RenderQueue {
    fragments: DashMap<FragmentId, PendingFragment>,
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `markdown` for conversion and return its placeholder.
    ///
    /// No conversion happens here. `post_processor`, if given, runs on the converted HTML
    /// during [`flush`](Self::flush).
    pub fn enqueue(
        &self,
        markdown: impl Into<String>,
        post_processor: Option<Arc<dyn HtmlPostProcessor>>,
    ) -> Deferred {
        let id = FragmentId::new();
        self.fragments.insert(
            id,
            PendingFragment {
                markdown: markdown.into(),
                post_processor,
            },
        );
        Deferred {
            id,
            placeholder: id.placeholder(),
        }
    }

    /// Number of fragments enqueued so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Convert every fragment exactly once, in parallel, and hand back the results.
    ///
    /// # Errors
    ///
    /// Returns an error if a conversion task fails to join.
    pub async fn flush(self) -> Result<RenderedFragments> {
        let total = self.fragments.len();
        tracing::debug!("Performing deferred markdown rendering of {} fragments", total);
        let started = std::time::Instant::now();

        let mut slots: HashMap<FragmentId, Option<String>> =
            self.fragments.iter().map(|entry| (*entry.key(), None)).collect();

        let workers = std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get);
        let chunk_size = total.div_ceil(workers).max(1);

        let mut chunks: Vec<Vec<(FragmentId, PendingFragment)>> = Vec::new();
        let mut current = Vec::with_capacity(chunk_size);
        for (id, fragment) in self.fragments {
            current.push((id, fragment));
            if current.len() == chunk_size {
                chunks.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        let converted = map_blocking(
            chunks,
            Arc::new(|chunk: Vec<(FragmentId, PendingFragment)>| {
                Ok::<_, anyhow::Error>(chunk
                    .into_iter()
                    .map(|(id, fragment)| {
                        let html = to_html(&fragment.markdown);
                        let html = match &fragment.post_processor {
                            Some(processor) => processor.process(&html),
                            None => html,
                        };
                        (id, html)
                    })
                    .collect::<Vec<_>>())
            }),
        )
        .await?;

        for (id, html) in converted.into_iter().flatten() {
            slots.insert(id, Some(html));
        }

        tracing::debug!(
            "Rendered {} markdown fragments in {} ms",
            total,
            started.elapsed().as_millis()
        );

        Ok(RenderedFragments {
            slots,
        })
    }

    /// Flush a queue that was shared with drafting tasks.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::QueueStillShared`] if any other handle to the queue is alive.
    pub async fn flush_shared(queue: Arc<Self>) -> Result<RenderedFragments> {
        match Arc::try_unwrap(queue) {
            Ok(queue) => queue.flush().await,
            Err(shared) => Err(DocError::QueueStillShared {
                owners: Arc::strong_count(&shared) - 1,
            }
            .into()),
        }
    }
}

/// Splice-phase results of a flushed [`RenderQueue`].
#[derive(Debug, Default)]
pub struct RenderedFragments {
    slots: HashMap<FragmentId, Option<String>>,
}

impl RenderedFragments {
    /// Number of fragments known to this batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Converted HTML of one fragment.
    ///
    /// # Errors
    ///
    /// [`DocError::UnknownFragment`] or [`DocError::FragmentNotRendered`].
    pub fn html(&self, id: &FragmentId) -> Result<&str> {
        match self.slots.get(id) {
            None => Err(DocError::UnknownFragment {
                id: id.to_string(),
            }
            .into()),
            Some(None) => Err(DocError::FragmentNotRendered {
                id: id.to_string(),
            }
            .into()),
            Some(Some(html)) => Ok(html),
        }
    }

    /// Replace the placeholders of `ids` in `host` with their converted HTML.
    ///
    /// Ids are processed in reverse of the given (production) order. Fragment HTML that
    /// contains placeholders of other listed ids is expanded first, so no placeholder of
    /// a listed id survives.
    ///
    /// # Errors
    ///
    /// - [`DocError::UnknownFragment`] for an id this batch never saw
    /// - [`DocError::FragmentNotRendered`] for an id without a result
    /// - [`DocError::FragmentCycle`] for a fragment that contains itself
    pub fn splice(&self, host: &str, ids: &[FragmentId]) -> Result<String> {
        for id in ids {
            self.html(id)?;
        }

        let mut expanded: HashMap<FragmentId, String> = HashMap::with_capacity(ids.len());
        let mut out = host.to_string();

        for id in ids.iter().rev() {
            let mut visiting = HashSet::new();
            let html = self.expand(*id, ids, &mut expanded, &mut visiting)?;
            out = out.replace(&id.placeholder(), &html);
        }

        Ok(out)
    }

    fn expand(
        &self,
        id: FragmentId,
        ids: &[FragmentId],
        expanded: &mut HashMap<FragmentId, String>,
        visiting: &mut HashSet<FragmentId>,
    ) -> Result<String> {
        if let Some(done) = expanded.get(&id) {
            return Ok(done.clone());
        }
        if !visiting.insert(id) {
            return Err(DocError::FragmentCycle {
                id: id.to_string(),
            }
            .into());
        }

        let mut html = self.html(&id)?.to_string();
        if html.contains(PLACEHOLDER_PREFIX) {
            for other in ids.iter().rev() {
                let placeholder = other.placeholder();
                if !html.contains(&placeholder) {
                    continue;
                }
                if *other == id {
                    return Err(DocError::FragmentCycle {
                        id: id.to_string(),
                    }
                    .into());
                }
                let inner = self.expand(*other, ids, expanded, visiting)?;
                html = html.replace(&placeholder, &inner);
            }
        }

        visiting.remove(&id);
        expanded.insert(id, html.clone());
        Ok(html)
    }

    #[cfg(test)]
    fn with_slots(slots: Vec<(FragmentId, Option<&str>)>) -> Self {
        Self {
            slots: slots.into_iter().map(|(id, html)| (id, html.map(str::to_string))).collect(),
        }
    }
}
