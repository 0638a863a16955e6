//! Build orchestration
//!
//! [`DocBuilder`] runs one documentation build through its phases:
//!
//! 1. **Load** - reference map, outline, layout, API documents and indices, in parallel
//! 2. **Draft** - every article and API document rendered to a [`Draft`] holding
//!    placeholders
//! 3. **Flush** - the shared render queue converts all Markdown fragments
//! 4. **Finalize** - drafts are spliced, post-processed and written, in parallel
//! 5. **Report** - dead links fail the build, the sitemap and optional quality report
//!    are written, and unresolved references fail the build in strict mode
//!
//! The render queue is shared with drafting tasks through [`RenderContext`]; it can only
//! be flushed once every draft is done and the context is dropped.

use crate::config::BuilderSettings;
use crate::core::DocError;
use crate::loader;
use crate::markdown::{RenderQueue, list_markdown_files};
use crate::models::{ApiDocumentQuality, ArticleQuality};
use crate::references::ReferenceMap;
use crate::render::{Draft, EntityCache, RenderContext, SubclassIndex, render_article, render_document};
use crate::site::{Finalizer, FinishedPage, Layout, LinkVerifier, QualityReport, load_outline};
use crate::site::{reset_output_dir, write_sitemap};
use crate::utils::map_blocking;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a successful build.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub articles: usize,
    pub documents: usize,
    pub fragments: usize,
    /// Distinct unresolved references, only non-zero in lenient mode
    pub unresolved: usize,
    pub elapsed: Duration,
}

impl BuildSummary {
    #[must_use]
    pub fn pages(&self) -> usize {
        self.articles + self.documents
    }
}

/// Everything loaded before drafting starts.
struct Sources {
    references: Arc<ReferenceMap>,
    navigation: String,
    layout: Layout,
    entities: Arc<EntityCache>,
    indices: Arc<SubclassIndex>,
}

/// Drafts plus the quality records gathered while drafting them.
#[derive(Default)]
struct Drafted {
    drafts: Vec<Draft>,
    articles: Vec<ArticleQuality>,
    documents: Vec<ApiDocumentQuality>,
}

/// Runs documentation builds for one set of [`BuilderSettings`].
#[derive(Debug, Clone)]
pub struct DocBuilder {
    settings: Arc<BuilderSettings>,
}

impl DocBuilder {
    #[must_use]
    pub fn new(settings: BuilderSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Build the site.
    ///
    /// # Errors
    ///
    /// Any load or render failure, [`DocError::DeadLinks`] if any page links to a page
    /// that does not exist, and [`DocError::UnresolvedReferences`] in strict mode.
    pub async fn build(&self) -> Result<BuildSummary> {
        let started = Instant::now();
        let settings = &self.settings;
        tracing::info!("Starting generation of docs from root path {}", settings.root.display());

        if !settings.articles_dir().is_dir() {
            return Err(DocError::SourceFileNotFound {
                what: "articles directory".to_string(),
                path: settings.articles_dir().display().to_string(),
            }
            .into());
        }
        reset_output_dir(&settings.output)?;

        let sources = self.load().await?;
        let references = Arc::clone(&sources.references);

        let queue = Arc::new(RenderQueue::new());
        let ctx = RenderContext {
            queue: Arc::clone(&queue),
            entities: Arc::clone(&sources.entities),
            indices: Arc::clone(&sources.indices),
            references: Arc::clone(&references),
        };
        let drafted = self.draft(ctx).await?;

        let fragments = queue.len();
        let phase = Instant::now();
        let rendered = RenderQueue::flush_shared(queue).await?;
        tracing::debug!("Flushed {} fragments in {:?}", fragments, phase.elapsed());

        let verifier =
            LinkVerifier::new(drafted.drafts.iter().map(|d| d.path.clone()), settings.output.clone());
        let finalizer = Finalizer {
            fragments: rendered,
            references: Arc::clone(&references),
            verifier,
            layout: sources.layout,
            navigation: sources.navigation,
            legacy_links: settings.site.legacy_links.clone(),
            output: settings.output.clone(),
        };
        let (articles, documents) = (drafted.articles.len(), drafted.documents.len());
        let pages = finalize(finalizer, drafted.drafts).await?;

        check_dead_links(&pages)?;
        write_sitemap(&settings.output, &settings.base_url, &pages)?;

        let unresolved = references.unresolved();
        if settings.report {
            QualityReport {
                documents: drafted.documents,
                articles: drafted.articles,
                unresolved: unresolved.clone(),
            }
            .write(&settings.report_path())?;
        }

        if !unresolved.is_empty() {
            log_unresolved(&references, &unresolved, settings.strict_references);
            if settings.strict_references {
                return Err(DocError::UnresolvedReferences {
                    count: unresolved.len(),
                }
                .into());
            }
        }

        let summary = BuildSummary {
            articles,
            documents,
            fragments,
            unresolved: unresolved.len(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Generated {} pages ({} articles, {} API documents) in {:?}",
            summary.pages(),
            summary.articles,
            summary.documents,
            summary.elapsed
        );
        Ok(summary)
    }

    async fn load(&self) -> Result<Sources> {
        let phase = Instant::now();
        tracing::info!("Loading sources");

        let (references, navigation, layout, documents, indices) = tokio::try_join!(
            blocking(Arc::clone(&self.settings), ReferenceMap::load),
            blocking(Arc::clone(&self.settings), load_outline),
            blocking(Arc::clone(&self.settings), Layout::load),
            loader::load_documents(&self.settings),
            loader::load_indices(&self.settings),
        )?;

        let entities = EntityCache::new(documents);
        let indices = SubclassIndex::new(indices);
        tracing::debug!(
            "Loaded {} reference map entries, {} API documents and {} indices in {:?}",
            references.len(),
            entities.len(),
            indices.len(),
            phase.elapsed()
        );

        Ok(Sources {
            references: Arc::new(references),
            navigation,
            layout,
            entities: Arc::new(entities),
            indices: Arc::new(indices),
        })
    }

    /// Draft every article and API document. Consumes `ctx` so the queue is no longer
    /// shared once this returns.
    async fn draft(&self, ctx: RenderContext) -> Result<Drafted> {
        let phase = Instant::now();
        tracing::info!("Rendering articles and API documents");

        let articles_dir = self.settings.articles_dir();
        let sources = list_markdown_files(&articles_dir)?;
        let articles = map_blocking(
            sources,
            Arc::new({
                let ctx = ctx.clone();
                move |source: PathBuf| render_article(&source, &articles_dir, &ctx)
            }),
        );

        let positions: Vec<usize> = (0..ctx.entities.len()).collect();
        let documents = map_blocking(
            positions,
            Arc::new({
                let ctx = ctx.clone();
                move |position: usize| render_document(&ctx.entities.documents()[position], &ctx)
            }),
        );

        let (articles, documents) = tokio::try_join!(articles, documents)?;
        drop(ctx);

        let mut drafted = Drafted::default();
        for (draft, quality) in articles {
            drafted.drafts.push(draft);
            drafted.articles.push(quality);
        }
        for (draft, quality) in documents.into_iter().flatten() {
            drafted.drafts.push(draft);
            drafted.documents.push(quality);
        }

        tracing::debug!(
            "Drafted {} articles and {} API documents in {:?}",
            drafted.articles.len(),
            drafted.documents.len(),
            phase.elapsed()
        );
        Ok(drafted)
    }
}

/// Run a settings-based loader on the blocking pool.
async fn blocking<R, F>(settings: Arc<BuilderSettings>, load: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce(&BuilderSettings) -> Result<R> + Send + 'static,
{
    tokio::task::spawn_blocking(move || load(&settings)).await.context("Failed to join loader task")?
}

async fn finalize(finalizer: Finalizer, drafts: Vec<Draft>) -> Result<Vec<FinishedPage>> {
    let phase = Instant::now();
    tracing::info!("Writing {} pages", drafts.len());

    let finalizer = Arc::new(finalizer);
    let pages = map_blocking(drafts, Arc::new(move |draft: Draft| finalizer.finalize(&draft))).await?;

    tracing::debug!("Finalized {} pages in {:?}", pages.len(), phase.elapsed());
    Ok(pages)
}

fn check_dead_links(pages: &[FinishedPage]) -> Result<()> {
    let mut broken: Vec<&FinishedPage> = pages.iter().filter(|p| !p.dead_links.is_empty()).collect();
    if broken.is_empty() {
        return Ok(());
    }
    broken.sort_by(|a, b| a.path.cmp(&b.path));

    let links: usize = broken.iter().map(|p| p.dead_links.len()).sum();
    tracing::error!("{} files had in total {} invalid/dead links in them:", broken.len(), links);
    for page in &broken {
        tracing::error!("Missing links in file {}:", page.path);
        for link in &page.dead_links {
            tracing::error!(" - {link}");
        }
    }

    Err(DocError::DeadLinks {
        files: broken.len(),
        links,
    }
    .into())
}

fn log_unresolved(
    references: &ReferenceMap,
    unresolved: &std::collections::BTreeMap<String, Vec<String>>,
    strict: bool,
) {
    for (reference, pages) in unresolved {
        let hint = references.suggest(reference).map(|s| format!(" (did you mean '{s}'?)")).unwrap_or_default();
        let message = format!("Unresolved reference '{reference}' in {}{hint}", pages.join(", "));
        if strict {
            tracing::error!("{message}");
        } else {
            tracing::warn!("{message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SiteFixture, init_test_logging};

    fn settings(site: &SiteFixture, report: bool, lenient: bool) -> BuilderSettings {
        BuilderSettings::new(site.root(), "https://docs.example.com", None, report, lenient).unwrap()
    }

    #[tokio::test]
    async fn test_build_writes_every_page() {
        init_test_logging(None);
        let site = SiteFixture::new().unwrap();

        let summary = DocBuilder::new(settings(&site, true, false)).build().await.unwrap();
        assert_eq!(summary.articles, 2);
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.pages(), 3);
        assert_eq!(summary.unresolved, 0);

        let index = site.read_output("index.html").unwrap();
        assert!(index.contains("<title>Welcome - Documentation</title>"));
        assert!(index.contains("<a href=\"fuse/node.html\">Node</a>"));
        assert!(index.contains("<a href=\"basics/intro.html\">the introduction</a>"));
        assert!(index.contains("<a href=\"https://docs.example.com/basics/intro.html\">Introduction</a>"));
        assert!(!index.contains("deferred-markdown"));

        let intro = site.read_output("basics/intro.html").unwrap();
        assert!(intro.contains("<code>@Node</code>"));
        assert!(intro.contains("<a href=\"../index.html\">home</a>"));

        let node = site.read_output("fuse/node.html").unwrap();
        assert!(node.contains("<title>Node Class - Documentation</title>"));
        assert!(node.contains("<a href=\"../basics/intro.html\">intro</a>"));

        let sitemap = site.read_output("sitemap.xml").unwrap();
        assert!(sitemap.contains("<loc>https://docs.example.com/fuse/node.html</loc>"));
        assert!(site.output().join("generator-report.html").is_file());
    }

    #[tokio::test]
    async fn test_stale_output_is_removed() {
        let site = SiteFixture::new().unwrap();
        site.write("generated/stale.html", "old").unwrap();

        DocBuilder::new(settings(&site, false, false)).build().await.unwrap();
        assert!(!site.output().join("stale.html").exists());
        assert!(!site.output().join("generator-report.html").exists());
    }

    #[tokio::test]
    async fn test_dead_links_fail_the_build() {
        let site = SiteFixture::new().unwrap();
        site.write("articles/broken.md", "# Broken\n\n[nowhere](missing.md) and [gone](gone.html)\n").unwrap();

        let err = DocBuilder::new(settings(&site, false, false)).build().await.unwrap_err();
        match err.downcast_ref::<DocError>() {
            Some(DocError::DeadLinks { files, links }) => {
                assert_eq!(*files, 1);
                assert_eq!(*links, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unresolved_references_strict_and_lenient() {
        let site = SiteFixture::new().unwrap();
        site.write("articles/typo.md", "# Typo\n\nSee @Nod for details.\n").unwrap();

        let err = DocBuilder::new(settings(&site, false, false)).build().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::UnresolvedReferences { count: 1 })));

        let summary = DocBuilder::new(settings(&site, true, true)).build().await.unwrap();
        assert_eq!(summary.unresolved, 1);
        let typo = site.read_output("typo.html").unwrap();
        assert!(typo.contains("See Nod for details."));
        let report = site.read_output("generator-report.html").unwrap();
        assert!(report.contains("@Nod"));
    }

    #[tokio::test]
    async fn test_missing_articles_directory() {
        let site = SiteFixture::new().unwrap();
        std::fs::remove_dir_all(site.root().join("articles")).unwrap();

        let err = DocBuilder::new(settings(&site, false, false)).build().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::SourceFileNotFound { .. })));
    }
}
