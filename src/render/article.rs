//! Markdown article rendering

use super::{Draft, DraftKind, PageWriter, RenderContext};
use crate::models::ArticleQuality;
use crate::utils::{count_lines, site_path};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Draft the article at `source`.
///
/// The output path mirrors the file's location under `articles_dir` with `.md`
/// replaced by `.html`. `[subclass ...]` tags are expanded before the body is enqueued,
/// so the listing fragments come first in the draft's fragment list.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lies outside `articles_dir`, or a
/// subclass listing fails to render.
pub fn render_article(source: &Path, articles_dir: &Path, ctx: &RenderContext) -> Result<(Draft, ArticleQuality)> {
    let relative = site_path(articles_dir, source)
        .with_context(|| format!("Article {} is not inside {}", source.display(), articles_dir.display()))?;
    let path = match relative.strip_suffix(".md") {
        Some(stem) => format!("{stem}.html"),
        None => match relative.rsplit_once('.') {
            Some((stem, _)) => format!("{stem}.html"),
            None => format!("{relative}.html"),
        },
    };

    let markdown = std::fs::read_to_string(source)
        .with_context(|| format!("Failed to read article {}", source.display()))?;
    let modified = std::fs::metadata(source)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read modification time of {}", source.display()))?;

    let embedded = ctx.indices.embed(&markdown, &path, &ctx.entities, &ctx.queue)?;
    let mut writer = PageWriter::new(&ctx.queue);
    writer.adopt(embedded.fragments);
    writer.markdown(embedded.html, None);
    let rendered = writer.finish();

    tracing::debug!("Drafted article {} with {} fragment(s)", path, rendered.fragments.len());

    let quality = ArticleQuality {
        path: path.clone(),
        lines: count_lines(&markdown),
    };
    Ok((
        Draft {
            kind: DraftKind::Article,
            path,
            html: rendered.html,
            fragments: rendered.fragments,
            source_modified: DateTime::<Utc>::from(modified),
        },
        quality,
    ))
}

/// Point links between articles at their rendered pages.
///
/// `.md` targets in Markdown links and `href` attributes become `.html`, and image
/// sources climbing one level out of the articles tree are made site-relative.
#[must_use]
pub fn fix_article_links(html: &str) -> String {
    html.replace(".md)", ".html)")
        .replace(".md\"", ".html\"")
        .replace(".md#", ".html#")
        .replace("<img src=\"../", "<img src=\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::RenderQueue;
    use crate::models::{ApiIndex, TocItem};
    use crate::render::test_support::{context, entity};
    use crate::render::SubclassIndex;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_fix_article_links() {
        let html = r#"<a href="basics/intro.md">a</a> <a href="faq.md#top">b</a> [c](other.md) <img src="../img/x.png">"#;
        assert_eq!(
            fix_article_links(html),
            r#"<a href="basics/intro.html">a</a> <a href="faq.html#top">b</a> [c](other.html) <img src="img/x.png">"#
        );
        assert_eq!(fix_article_links("readme.markdown"), "readme.markdown");
    }

    #[tokio::test]
    async fn test_render_article() {
        let temp = TempDir::new().unwrap();
        let articles = temp.path().join("articles");
        std::fs::create_dir_all(articles.join("guides")).unwrap();
        let source = articles.join("guides").join("start.md");
        std::fs::write(&source, "# Start\n\nSee [next](next.md).\n").unwrap();

        let ctx = context(Vec::new());
        let (draft, quality) = render_article(&source, &articles, &ctx).unwrap();
        assert_eq!(draft.path, "guides/start.html");
        assert_eq!(draft.kind, DraftKind::Article);
        assert_eq!(draft.fragments.len(), 1);
        assert_eq!(quality.path, "guides/start.html");
        assert_eq!(quality.lines, 4);

        let RenderContext { queue, .. } = ctx;
        let rendered = RenderQueue::flush_shared(queue).await.unwrap();
        let html = fix_article_links(&rendered.splice(&draft.html, &draft.fragments).unwrap());
        assert!(html.contains("<h1>Start</h1>"));
        assert!(html.contains("href=\"next.html\""));
    }

    #[test]
    fn test_article_with_subclass_listing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("controls.md");
        std::fs::write(&source, "Controls:\n\n[subclass Fuse.Controls.Control]\n").unwrap();

        let mut button = TocItem::from(&entity("Fuse.Controls.Button", "Class", "fuse/controls/button", "Button"));
        button.comment = Some(crate::models::Comment {
            brief: Some("A button.".to_string()),
            full: Some("A button.".to_string()),
            ..crate::models::Comment::default()
        });
        let mut ctx = context(Vec::new());
        ctx.indices = Arc::new(SubclassIndex::new(vec![ApiIndex {
            root: entity("Fuse.Controls.Control", "Class", "fuse/controls/control", "Control"),
            descendants: vec![button],
            ..ApiIndex::default()
        }]));

        let (draft, _) = render_article(&source, temp.path(), &ctx).unwrap();
        // listing brief first, then the article body
        assert_eq!(draft.fragments.len(), 2);
        assert_eq!(ctx.queue.len(), 2);
    }

    #[test]
    fn test_missing_article_fails() {
        let temp = TempDir::new().unwrap();
        let ctx = context(Vec::new());
        assert!(render_article(&temp.path().join("gone.md"), temp.path(), &ctx).is_err());
    }
}
