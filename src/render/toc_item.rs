//! Rendering of one table-of-contents row.
//!
//! A row is an `<article class="table-of-contents-item">` holding a kind icon, the
//! linked index title with inline annotations (attached-by, return type, language) and
//! the item's brief. The brief goes through the render queue like every other piece of
//! Markdown.

use super::titles::index_title;
use super::{EntityCache, PageWriter, Rendered};
use crate::core::DocError;
use crate::markdown::RenderQueue;
use crate::models::{TocItem, non_blank};
use crate::utils::{count_lines, escape_html, relative_path};
use anyhow::Result;

/// A rendered row and the comment size it represents.
#[derive(Debug, Clone, Default)]
pub struct RenderedTocItem {
    pub rendered: Rendered,
    /// Lines of the item's full comment, 0 if it has no brief
    pub comment_lines: usize,
}

/// Render `item` as seen from the page at `current_path`.
///
/// # Errors
///
/// - [`DocError::UnknownKind`] if the item's kind has no icon
/// - [`DocError::MissingTitle`] if no title can be derived
/// - [`DocError::MissingParent`] if an attached UX item or its owner is not in `cache`
/// - [`DocError::MissingScriptAttribute`] for JavaScript items without script comments
pub fn render_toc_item(
    item: &TocItem,
    cache: &EntityCache,
    queue: &RenderQueue,
    current_path: &str,
    advanced: bool,
) -> Result<RenderedTocItem> {
    let mut writer = PageWriter::new(queue);

    if advanced {
        writer.line("<article class=\"table-of-contents-item is-advanced\">");
    } else {
        writer.line("<article class=\"table-of-contents-item\">");
    }

    let kind = item.id.kind.as_str();
    writer.line(format!(
        "<span class=\"table-of-contents-item-type table-of-contents-item-type-{} fa fa-{}\" title=\"{}\"></span>",
        kind.to_lowercase(),
        type_icon(item)?,
        escape_html(kind)
    ));

    let title = index_title(item)?;
    if title.trim().is_empty() {
        return Err(DocError::MissingTitle {
            id: item.id.id.clone(),
            path: current_path.to_string(),
        }
        .into());
    }

    let href = escape_html(&relative_path(current_path, &item.uri.href, Some("html")));
    writer.line("<h5>");
    writer.line(format!("<a href=\"{href}\">"));
    writer.line(escape_html(&title));
    writer.line("</a>");
    write_attached_by(&mut writer, item, cache, current_path)?;
    write_returns(&mut writer, item, current_path);
    writer.line(format!(
        "<span class=\"table-of-contents-item-language table-of-contents-item-language-{0}\">{0}</span>",
        language(kind)
    ));
    writer.line("</h5>");

    let mut comment_lines = 0;
    let comment = item.comment.as_ref();
    if let Some(brief) = non_blank(comment.and_then(|c| c.brief.as_deref())) {
        let full = non_blank(comment.and_then(|c| c.full.as_deref()));
        comment_lines = count_lines(full.unwrap_or(""));

        let mut markdown = brief.to_string();
        if comment.and_then(|c| c.full.as_deref()) != Some(brief) {
            markdown.push_str(&format!(
                " <a href=\"{href}\" class=\"table-of-contents-item-has-more\" title=\"There is more information available for this entry\"><i class=\"fa fa-ellipsis-h\"></i></a>"
            ));
        }

        writer.line("<div class=\"table-of-contents-item-brief\">");
        writer.markdown(markdown, None);
        writer.line("</div>");
    }

    writer.line("</article>");

    Ok(RenderedTocItem {
        rendered: writer.finish(),
        comment_lines,
    })
}

fn write_attached_by(
    writer: &mut PageWriter<'_>,
    item: &TocItem,
    cache: &EntityCache,
    current_path: &str,
) -> Result<()> {
    if !item.id.kind.starts_with("AttachedUx") {
        return Ok(());
    }

    let underlying = cache.get_by_href(&item.uri.href).ok_or_else(|| DocError::MissingParent {
        id: item.id.id.clone(),
        parent_id: item.uri.href.clone(),
    })?;
    let owner = cache.get(&underlying.id.parent_id).ok_or_else(|| DocError::MissingParent {
        id: item.id.id.clone(),
        parent_id: underlying.id.parent_id.clone(),
    })?;

    writer.line("<span class=\"table-of-contents-item-inline-attached-by\">");
    writer.line(format!(
        "(attached by <a href=\"{}\">{}</a>)",
        escape_html(&relative_path(current_path, &owner.uri.href, Some("html"))),
        escape_html(&owner.titles.index_title)
    ));
    writer.line("</span>");
    Ok(())
}

fn write_returns(writer: &mut PageWriter<'_>, item: &TocItem, current_path: &str) {
    if item.id.kind == "JsMethod" {
        return;
    }
    let Some(returns) = &item.returns else {
        return;
    };

    writer.line("<span class=\"table-of-contents-item-inline-returns\"> : ");
    let link = returns.link();
    if let Some(href) = link {
        writer.line(format!(
            "<a href=\"{}\">",
            escape_html(&relative_path(current_path, href, Some("html")))
        ));
    }
    writer.line(escape_html(&readable_type(&returns.title)));
    if link.is_some() {
        writer.line("</a>");
    }
    writer.line("</span>");
}

/// `List<T>` and `IList<T>` read as `List of T` and `IList of T`.
fn readable_type(title: &str) -> String {
    if title.starts_with("List<") || title.starts_with("IList<") {
        if let Some((prefix, generics)) = title.split_once('<') {
            return format!("{prefix} of {}", generics.trim_end_matches('>'));
        }
    }
    title.to_string()
}

/// Language badge of a kind.
fn language(kind: &str) -> &'static str {
    match kind.to_lowercase().as_str() {
        "jsmodule" | "jsproperty" | "jsevent" | "jsmethod" => "js",
        "uxclass" | "uxproperty" | "uxevent" | "attacheduxproperty" | "attacheduxevent" => "ux",
        _ => "uno",
    }
}

/// Font Awesome icon of an item's kind.
fn type_icon(item: &TocItem) -> Result<&'static str> {
    let icon = match item.id.kind.to_lowercase().as_str() {
        "property" | "uxproperty" | "jsproperty" | "attacheduxproperty" => {
            if item.flags.is_some_and(|f| f.any()) {
                let returns = item.returns.as_ref().and_then(|r| r.href.as_deref()).unwrap_or("");
                if returns.starts_with("uno/collections/list_")
                    || returns.starts_with("uno/collections/ilist_")
                {
                    "cubes"
                } else {
                    "cube"
                }
            } else {
                "wrench"
            }
        }
        "event" | "uxevent" | "jsevent" | "attacheduxevent" => "bolt",
        "jsmethod" | "method" => "square-o",
        "constructor" => "check",
        "literal" => "tag",
        "class" | "uxclass" | "jsmodule" => "cog",
        "namespace" => "gears",
        "enum" => "tags",
        "struct" => "th",
        "delegate" => "arrow-circle-o-right",
        "interface" => "file-o",
        "operator" => "asterisk",
        "field" => "circle-o",
        "cast" => "repeat",
        "swizzlertype" => "files-o",
        _ => {
            return Err(DocError::UnknownKind {
                id: item.id.id.clone(),
                kind: item.id.kind.clone(),
            }
            .into());
        }
    };
    Ok(icon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Comment, EntityId, EntityUri, Flags, Returns, Titles};
    use crate::render::test_support::{document, entity};

    fn item(kind: &str, href: &str, title: &str) -> TocItem {
        TocItem {
            id: EntityId {
                id: title.to_string(),
                kind: kind.to_string(),
                ..EntityId::default()
            },
            uri: EntityUri {
                href: href.to_string(),
                id_uri: Some(href.to_string()),
            },
            titles: Titles {
                index_title: title.to_string(),
                ..Titles::default()
            },
            ..TocItem::default()
        }
    }

    fn render(item: &TocItem, cache: &EntityCache) -> Result<RenderedTocItem> {
        let queue = RenderQueue::new();
        render_toc_item(item, cache, &queue, "fuse/controls/button", false)
    }

    #[test]
    fn test_basic_row() {
        let mut row = item("Method", "fuse/node/dispose", "Dispose");
        row.returns = Some(Returns {
            href: Some("uno/collections/list_1".to_string()),
            is_virtual: false,
            title: "List<Visual>".to_string(),
        });

        let rendered = render(&row, &EntityCache::default()).unwrap();
        let html = &rendered.rendered.html;
        assert!(html.starts_with("<article class=\"table-of-contents-item\">\n"));
        assert!(html.contains("table-of-contents-item-type-method fa fa-square-o\" title=\"Method\""));
        assert!(html.contains("<a href=\"../../fuse/node/dispose.html\">\nDispose\n</a>"));
        assert!(html.contains("List of Visual"));
        assert!(html.contains("<a href=\"../../uno/collections/list_1.html\">"));
        assert!(html.contains("table-of-contents-item-language-uno\">uno</span>"));
        assert!(rendered.rendered.fragments.is_empty());
        assert_eq!(rendered.comment_lines, 0);
    }

    #[test]
    fn test_brief_with_more_link() {
        let mut row = item("UxProperty", "fuse/node/width", "Width");
        row.comment = Some(Comment {
            brief: Some("The width.".to_string()),
            full: Some("The width.\n\nIn points.".to_string()),
            ..Comment::default()
        });

        let queue = RenderQueue::new();
        let rendered =
            render_toc_item(&row, &EntityCache::default(), &queue, "fuse/node", true).unwrap();
        assert!(rendered.rendered.html.starts_with("<article class=\"table-of-contents-item is-advanced\">"));
        assert!(rendered.rendered.html.contains("fa-wrench"));
        assert!(rendered.rendered.html.contains("language-ux\">ux<"));
        assert_eq!(rendered.rendered.fragments.len(), 1);
        assert_eq!(rendered.comment_lines, 3);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_property_icon_flags() {
        let mut row = item("UxProperty", "fuse/panel/children", "Children");
        row.flags = Some(Flags {
            ux_components: true,
            ..Flags::default()
        });
        row.returns = Some(Returns {
            href: Some("uno/collections/ilist_1".to_string()),
            is_virtual: true,
            title: "IList<Node>".to_string(),
        });

        let html = render(&row, &EntityCache::default()).unwrap().rendered.html;
        assert!(html.contains("fa fa-cubes"));
        assert!(html.contains("IList of Node"));
        // virtual return types are never linked
        assert!(!html.contains("ilist_1.html"));
    }

    #[test]
    fn test_unknown_kind_fails() {
        let err = render(&item("Gadget", "x", "X"), &EntityCache::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::UnknownKind { .. })));
    }

    #[test]
    fn test_missing_title_fails() {
        let err = render(&item("Class", "x", ""), &EntityCache::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MissingTitle { .. })));
    }

    #[test]
    fn test_attached_by() {
        let grid = entity("Fuse.Layouts.Grid", "Class", "fuse/layouts/grid", "Grid");
        let mut row_entity = entity("Fuse.Layouts.Grid.Row", "AttachedUxProperty", "fuse/layouts/grid/row", "Grid.Row");
        row_entity.id.parent_id = "Fuse.Layouts.Grid".to_string();
        let cache = EntityCache::new(vec![document(grid), document(row_entity)]);

        let row = item("AttachedUxProperty", "fuse/layouts/grid/row", "Grid.Row");
        let html = render(&row, &cache).unwrap().rendered.html;
        assert!(html.contains("\nRow\n"));
        assert!(html.contains("(attached by <a href=\"../../fuse/layouts/grid.html\">Grid</a>)"));

        let err = render(&row, &EntityCache::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MissingParent { .. })));
    }
}
