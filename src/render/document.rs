//! API page rendering
//!
//! [`render_document`] turns one [`ApiDocument`] into a [`Draft`]. Sections are written
//! in a fixed order and each one is skipped when its data is absent:
//!
//! 1. page header (title, topic subtitle, advanced toggle)
//! 2. jump-to links
//! 3. deprecated or experimental notice
//! 4. attached-by note for attached UX implementations
//! 5. main comment
//! 6. UX section
//! 7. location
//! 8. parameters
//! 9. returns
//! 10. enum values
//! 11. table of contents, by kind on namespace pages, by declaring type elsewhere
//! 12. implemented interfaces
//! 13. remarks
//! 14. examples
//! 15. see also
//!
//! Markdown from comments is enqueued with [`ShiftHeadings`] so authored headings sit
//! below the page's own `h2`/`h3` structure.

use super::titles::{attached_info, has_only_advanced, is_advanced, page_title};
use super::toc_item::render_toc_item;
use super::{Draft, DraftKind, PageWriter, RenderContext};
use crate::markdown::{HtmlPostProcessor, ShiftHeadings};
use crate::models::{ApiDocument, ApiDocumentQuality, DeclaredInGroup, Entity, TocItem, TypeGroup, non_blank};
use crate::toc::{split_by_declared_in, split_by_type};
use crate::utils::{count_lines, escape_html, relative_path};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Output path of an API document, or `None` for kinds that get no page.
#[must_use]
pub fn api_output_path(entity: &Entity) -> Option<String> {
    match entity.id.kind.as_str() {
        "SwizzlerType" => None,
        "Root" if entity.id.id == "__root__" => Some("root-ns.html".to_string()),
        _ => Some(format!("{}.html", entity.uri.href)),
    }
}

/// Per-page rendering state.
struct PageState<'a> {
    ctx: &'a RenderContext,
    document: &'a ApiDocument,
    writer: PageWriter<'a>,
    shift: Arc<dyn HtmlPostProcessor>,
    comment_lines: usize,
    toc_comment_lines: BTreeMap<String, usize>,
}

impl PageState<'_> {
    fn entity(&self) -> &Entity {
        &self.document.entity
    }

    fn href(&self) -> &str {
        &self.document.entity.uri.href
    }

    fn link(&self, target: &str) -> String {
        escape_html(&relative_path(self.href(), target, Some("html")))
    }

    fn has_toc(&self) -> bool {
        !self.document.table_of_contents.is_empty()
    }

    /// Enqueue comment Markdown after expanding subclass tags in it.
    fn comment_markdown(&mut self, markdown: &str) -> Result<()> {
        let embedded =
            self.ctx.indices.embed(markdown, self.href(), &self.ctx.entities, &self.ctx.queue)?;
        self.writer.adopt(embedded.fragments);
        self.writer.markdown(embedded.html, Some(Arc::clone(&self.shift)));
        Ok(())
    }

    /// Enqueue plain Markdown with heading shift.
    fn markdown(&mut self, markdown: &str) {
        self.writer.markdown(markdown, Some(Arc::clone(&self.shift)));
    }

    fn toc_item(&mut self, item: &TocItem, advanced: bool, record_quality: bool) -> Result<()> {
        let rendered = render_toc_item(item, &self.ctx.entities, &self.ctx.queue, self.href(), advanced)?;
        if record_quality {
            self.toc_comment_lines.insert(item.uri.identity().to_string(), rendered.comment_lines);
        }
        self.writer.append(rendered.rendered);
        Ok(())
    }
}

/// Draft the page of `document`.
///
/// Returns `None` for documents that get no page (`SwizzlerType`).
///
/// # Errors
///
/// Any per-entity failure of the title rules, table-of-contents organization or row
/// rendering, with the document's href as context.
pub fn render_document(
    document: &ApiDocument,
    ctx: &RenderContext,
) -> Result<Option<(Draft, ApiDocumentQuality)>> {
    let Some(path) = api_output_path(&document.entity) else {
        return Ok(None);
    };

    let mut state = PageState {
        ctx,
        document,
        writer: PageWriter::new(&ctx.queue),
        shift: Arc::new(ShiftHeadings),
        comment_lines: 0,
        toc_comment_lines: BTreeMap::new(),
    };

    write_sections(&mut state)
        .with_context(|| format!("Failed to render API document {}", document.entity.uri.href))?;

    let entity = &document.entity;
    let quality = ApiDocumentQuality {
        kind: entity.id.kind.clone(),
        href: entity.uri.href.clone(),
        qualified_title: entity.titles.fully_qualified_index_title.clone(),
        comment_lines: state.comment_lines,
        toc_comment_lines: state.toc_comment_lines,
    };
    let rendered = state.writer.finish();

    Ok(Some((
        Draft {
            kind: DraftKind::ApiDocument,
            path,
            html: rendered.html,
            fragments: rendered.fragments,
            source_modified: document.source_modified,
        },
        quality,
    )))
}

fn write_sections(state: &mut PageState<'_>) -> Result<()> {
    write_header(state)?;
    write_jump_links(state);
    write_notices(state);
    write_attached_by(state)?;
    write_comment(state)?;
    let ux = state.entity().comment_text(|c| c.ux.as_deref()).map(str::to_string);
    if let Some(ux) = ux {
        write_markdown_section(state, "ux", "UX", &ux)?;
    }
    write_location(state);
    write_parameters(state);
    write_returns(state);
    write_values(state);
    write_toc(state)?;
    write_interfaces(state)?;
    let remarks = state.entity().comment_text(|c| c.remarks.as_deref()).map(str::to_string);
    if let Some(remarks) = remarks {
        write_markdown_section(state, "remarks", "Remarks", &remarks)?;
    }
    let examples = state.entity().comment_text(|c| c.examples.as_deref()).map(str::to_string);
    if let Some(examples) = examples {
        write_markdown_section(state, "examples", "Examples", &examples)?;
    }
    write_see_also(state)
}

fn write_header(state: &mut PageState<'_>) -> Result<()> {
    let entity = state.entity();
    let mut title = page_title(entity, &state.ctx.entities)?;
    let mut sub_title = None;
    if let Some(topic) = entity.attrs().topic() {
        sub_title = Some(title);
        title = topic.to_string();
    }
    let has_toc = state.has_toc();
    let only_advanced = has_only_advanced(&state.document.table_of_contents, &entity.id);

    let w = &mut state.writer;
    w.line("<header class=\"page-header\">");
    w.line("<h2 id=\"section-introduction\">");
    w.line(escape_html(&title));
    if let Some(sub_title) = sub_title.filter(|s| !s.trim().is_empty()) {
        w.line(format!("<span class=\"sub-title\">{}</span>", escape_html(&sub_title)));
    }
    w.line("</h2>");

    if has_toc {
        w.line("<form class=\"advanced-toggle\">");
        w.line("<div class=\"form-check\">");
        if only_advanced {
            w.line("<input class=\"form-check-input\" type=\"checkbox\" id=\"showAdvancedCheckbox\" checked />");
        } else {
            w.line("<input class=\"form-check-input\" type=\"checkbox\" id=\"showAdvancedCheckbox\" />");
        }
        w.line("<label class=\"form-check-label\" for=\"showAdvancedCheckbox\">");
        w.line("Show advanced things");
        w.line("</label>");
        w.line("</div>");
        w.line("</form>");
    }
    w.line("</header>");

    if has_toc && only_advanced {
        w.line("<div class=\"alert alert-info alert-api-advanced-only\">");
        w.line("This page contains documentation for advanced features, so we have ");
        w.line("taken the liberty to tick the \"Show advanced things\" checkbox above for ");
        w.line("you in advance to be able to provide you with some additional information.");
        w.line("</div>");
    }
    Ok(())
}

fn write_jump_links(state: &mut PageState<'_>) {
    let entity = state.entity();
    let mut sections: Vec<(&str, &str)> = Vec::new();
    if entity.comment_text(|c| c.ux.as_deref()).is_some() {
        sections.push(("ux", "UX"));
    }
    if state.has_toc() {
        sections.push(("table-of-contents", "Table of Contents"));
    }
    if entity.comment_text(|c| c.remarks.as_deref()).is_some() {
        sections.push(("remarks", "Remarks"));
    }
    if entity.comment_text(|c| c.examples.as_deref()).is_some() {
        sections.push(("examples", "Examples"));
    }
    if !entity.attrs().see_also().is_empty() {
        sections.push(("see-also", "See Also"));
    }
    if sections.is_empty() {
        return;
    }

    let w = &mut state.writer;
    w.line("<section class=\"section-jump\">");
    w.line("<ul class=\"nav nav-pills\">");
    w.line("<li class=\"nav-item\"><a href=\"#\" class=\"nav-link disabled\">Jump to:</a></li>");
    for (key, title) in sections {
        w.line(format!(
            "<li class=\"nav-item\"><a href=\"#section-{}\" class=\"nav-link\">{}</a></li>",
            escape_html(key),
            escape_html(title)
        ));
    }
    w.line("</ul>");
    w.line("</section>");
}

fn write_notices(state: &mut PageState<'_>) {
    let attrs = state.document.entity.attrs();
    let notice = if attrs.deprecated() {
        Some(("alert-api-deprecated", "This entity is deprecated and will be removed in a future release."))
    } else if attrs.experimental() {
        Some((
            "alert-api-experimental",
            "This entity is experimental and might be changed or removed in a future release.",
        ))
    } else {
        None
    };

    if let Some((class, text)) = notice {
        let w = &mut state.writer;
        w.line("<section class=\"notifications\">");
        w.line(format!("<div class=\"alert alert-warning {class}\">"));
        w.line(text);
        w.line("</div>");
        w.line("</section>");
    }
}

fn write_attached_by(state: &mut PageState<'_>) -> Result<()> {
    let entity = state.entity();
    let Some(info) = attached_info(&entity.id, &entity.parameters, &entity.attributes, &state.ctx.entities)?
    else {
        return Ok(());
    };

    let href = state.link(&info.attached_by_href);
    let w = &mut state.writer;
    w.line("<p><em>");
    w.line(format!("Attached by <a href=\"{href}\">{}</a>.", escape_html(&info.attached_by_title)));
    w.line(format!(
        "Use full name <code>{}</code> in UX markup if ambiguous.",
        escape_html(&info.full_name)
    ));
    w.line("</em></p>");
    Ok(())
}

fn write_comment(state: &mut PageState<'_>) -> Result<()> {
    let Some(full) = state.entity().comment_text(|c| c.full.as_deref()).map(str::to_string) else {
        return Ok(());
    };
    state.comment_lines = count_lines(&full);
    state.comment_markdown(&full)
}

fn write_markdown_section(state: &mut PageState<'_>, class: &str, title: &str, markdown: &str) -> Result<()> {
    let embedded = state.ctx.indices.embed(markdown, state.href(), &state.ctx.entities, &state.ctx.queue)?;
    state.writer.adopt(embedded.fragments);
    state.writer.line(format!("<section class=\"documentation-{class}\">"));
    state.writer.line(format!("<h3 id=\"section-{class}\">{}</h3>", escape_html(title)));
    state.markdown(&embedded.html);
    state.writer.line("</section>");
    Ok(())
}

fn write_location(state: &mut PageState<'_>) {
    let document = state.document;
    let Some(location) = &document.entity.location else {
        return;
    };
    let namespace = non_blank(location.namespace_uri.as_deref());
    let package = non_blank(location.package_name.as_deref());
    if namespace.is_none() && package.is_none() {
        return;
    }

    let leaf = if state.has_toc() { "" } else { " type-location-leaf" };
    let namespace_href = namespace.map(|uri| state.link(uri));

    let w = &mut state.writer;
    w.line(format!("<section class=\"type-location{leaf}\">"));
    w.line("<h3 id=\"section-location\">Location</h3>");
    w.line("<dl>");
    if let Some(href) = namespace_href {
        w.line("<dt>Namespace</dt>");
        w.line("<dd>");
        w.line(format!("<a href=\"{href}\">"));
        w.line(escape_html(location.namespace_title.as_deref().unwrap_or_default()));
        w.line("</a>");
        w.line("</dd>");
    }
    if let Some(name) = package {
        let version = location.package_version.as_deref().unwrap_or_default();
        w.line("<dt>Package</dt>");
        w.line(format!("<dd>{}</dd>", escape_html(&format!("{name} {version}"))));
    }
    w.line("</dl>");
    w.line("</section>");
}

/// A parameter row, whichever source it came from.
struct ParameterRow {
    name: String,
    description: Option<String>,
    type_hint: Option<String>,
    type_href: Option<String>,
    type_title: Option<String>,
}

fn parameter_rows(entity: &Entity) -> Vec<ParameterRow> {
    let attrs = entity.attrs();
    match entity.id.kind.as_str() {
        "JsMethod" => attrs
            .get()
            .and_then(|a| a.script_method.as_ref())
            .map(|method| {
                method
                    .parameters
                    .iter()
                    .map(|name| {
                        let doc = attrs.parameter(name);
                        ParameterRow {
                            name: name.clone(),
                            description: doc.and_then(|d| d.description.clone()),
                            type_hint: doc.and_then(|d| d.type_hint.clone()),
                            type_href: None,
                            type_title: None,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default(),
        // Script events carry no parameter metadata
        "JsEvent" => Vec::new(),
        _ => entity
            .parameters
            .iter()
            .map(|param| ParameterRow {
                name: param.name.clone(),
                description: attrs.parameter(&param.name).and_then(|d| d.description.clone()),
                type_hint: None,
                type_href: if param.is_virtual { None } else { param.href.clone() },
                type_title: Some(param.title.clone()),
            })
            .collect(),
    }
}

fn write_type_paragraph(state: &mut PageState<'_>, title: Option<&str>, href: Option<&str>, hint: Option<&str>) {
    if let Some(title) = non_blank(title) {
        let link = non_blank(href).map(|h| state.link(h));
        let w = &mut state.writer;
        w.line("<p>");
        if let Some(link) = &link {
            w.line(format!("<a href=\"{link}\">"));
        }
        w.line(escape_html(title));
        if link.is_some() {
            w.line("</a>");
        }
        w.line("</p>");
    } else if let Some(hint) = non_blank(hint) {
        state.writer.line(format!("<p>{}</p>", escape_html(hint)));
    }
}

fn write_parameters(state: &mut PageState<'_>) {
    let rows = parameter_rows(state.entity());
    if rows.is_empty() {
        return;
    }

    state.writer.line("<section class=\"parameters\">");
    state.writer.line("<h3 id=\"section-parameters\">Parameters</h3>");
    state.writer.line("<dl>");
    for row in rows {
        state.writer.line(format!("<dt>{}</dt>", escape_html(&row.name)));
        state.writer.line("<dd>");
        write_type_paragraph(
            state,
            row.type_title.as_deref(),
            row.type_href.as_deref(),
            row.type_hint.as_deref(),
        );
        if let Some(description) = non_blank(row.description.as_deref()) {
            state.markdown(description);
        }
        state.writer.line("</dd>");
    }
    state.writer.line("</dl>");
    state.writer.line("</section>");
}

fn write_returns(state: &mut PageState<'_>) {
    let entity = state.entity();
    let comment = entity.attrs().get().and_then(|a| a.returns.clone());
    let comment_text = comment.as_ref().and_then(|c| c.text.clone());

    let (title, href, hint) = if entity.id.kind == "JsMethod" {
        let Some(comment) = &comment else {
            return;
        };
        if non_blank(comment.type_hint.as_deref()).is_none() && non_blank(comment.text.as_deref()).is_none() {
            return;
        }
        (None, None, comment.type_hint.clone())
    } else {
        let Some(returns) = &entity.returns else {
            return;
        };
        (Some(returns.title.clone()), returns.link().map(str::to_string), None)
    };

    state.writer.line("<section class=\"returns\">");
    state.writer.line("<h3 id=\"section-returns\">Returns</h3>");
    let link = non_blank(href.as_deref()).map(|h| state.link(h));
    let w = &mut state.writer;
    w.line("<p>");
    if let Some(title) = non_blank(title.as_deref()) {
        if let Some(link) = &link {
            w.line(format!("<a href=\"{link}\">"));
        }
        w.line(escape_html(title));
        if link.is_some() {
            w.line("</a>");
        }
    } else if let Some(hint) = non_blank(hint.as_deref()) {
        w.line(escape_html(hint));
    }
    w.line("</p>");
    if let Some(text) = non_blank(comment_text.as_deref()) {
        state.markdown(text);
    }
    state.writer.line("</section>");
}

fn write_values(state: &mut PageState<'_>) {
    let document = state.document;
    if document.entity.values.is_empty() {
        return;
    }

    state.writer.line("<section class=\"values\">");
    state.writer.line("<h3 id=\"section-values\">Possible Values</h3>");
    state.writer.line("<dl>");
    for value in &document.entity.values {
        let href = state.link(&value.uri);
        state.writer.line("<dt>");
        state.writer.line(format!("<a href=\"{href}\">"));
        state.writer.line(escape_html(&value.title));
        state.writer.line("</a>");
        state.writer.line("</dt>");
        state.writer.line("<dd>");
        if let Some(brief) = non_blank(value.comment.as_ref().and_then(|c| c.brief.as_deref())) {
            state.markdown(brief);
        }
        state.writer.line("</dd>");
    }
    state.writer.line("</dl>");
    state.writer.line("</section>");
}

fn write_toc(state: &mut PageState<'_>) -> Result<()> {
    if !state.has_toc() {
        return Ok(());
    }
    let document = state.document;

    state.writer.line("<section class=\"table-of-contents\">");
    match document.entity.id.kind.as_str() {
        "Namespace" | "Root" => {
            let groups = split_by_type(&document.table_of_contents);
            write_toc_by_type(state, &groups)?;
        }
        _ => {
            let groups = split_by_declared_in(&document.entity, &document.table_of_contents)?;
            write_toc_by_declared_in(state, &groups)?;
        }
    }
    state.writer.line("</section>");
    Ok(())
}

fn write_toc_by_type(state: &mut PageState<'_>, groups: &[TypeGroup]) -> Result<()> {
    let document = state.document;
    let page = &document.entity.id;
    for group in groups {
        state.writer.line(format!(
            "<h3 id=\"section-table-of-contents\">{}</h3>",
            escape_html(&group.title)
        ));
        state.writer.line("<section class=\"table-of-contents-section\">");
        for item in &group.items {
            state.toc_item(item, is_advanced(item, Some(page)), true)?;
        }
        state.writer.line("</section>");
    }
    Ok(())
}

fn write_toc_by_declared_in(state: &mut PageState<'_>, groups: &[DeclaredInGroup]) -> Result<()> {
    let document = state.document;
    let entity = &document.entity;
    state.writer.line("<h3 id=\"section-table-of-contents\">");
    state.writer.line(format!("Interface of {}", escape_html(&entity.titles.index_title)));
    state.writer.line("</h3>");

    for group in groups {
        let has_advanced = group.items.iter().any(|i| is_advanced(i, Some(&entity.id)));
        let only_advanced = group.items.iter().all(|i| is_advanced(i, Some(&entity.id)));

        let mut classes = vec!["table-of-contents-section"];
        if has_advanced {
            classes.push("has-advanced-items");
        }
        if only_advanced {
            classes.push("only-advanced-items");
        }
        if group.declared_in.as_ref().is_some_and(|d| d.uri.id_uri != entity.uri.id_uri) {
            classes.push("inherited");
        }
        if group.attached {
            classes.push("attached");
        }
        state.writer.line(format!("<section class=\"{}\">", classes.join(" ")));

        match &group.declared_in {
            Some(declared_in) if declared_in.id.id != entity.id.id => {
                let href = state.link(&declared_in.uri.href);
                state.writer.line(format!(
                    "<h4 id=\"section-table-of-contents-inherited-from-{}\">",
                    declared_in.uri.href.replace('/', "-")
                ));
                state.writer.line("Inherited from");
                state.writer.line(format!("<a href=\"{href}\">"));
                state.writer.line(escape_html(&declared_in.titles.index_title));
                state.writer.line("</a>");
                state.writer.line("</h4>");
            }
            _ if group.attached => {
                state.writer.line(
                    "<h4 id=\"section-table-of-contents-attached-ux-attributes\">Attached UX Attributes</h4>",
                );
            }
            _ => {}
        }

        for item in &group.items {
            state.toc_item(item, is_advanced(item, Some(&entity.id)), true)?;
        }
        state.writer.line("</section>");
    }
    Ok(())
}

fn write_interfaces(state: &mut PageState<'_>) -> Result<()> {
    let document = state.document;
    if document.entity.implemented_interfaces.is_empty() {
        return Ok(());
    }

    state.writer.line("<section class=\"interfaces\">");
    state.writer.line("<section class=\"table-of-contents\">");
    state.writer.line("<section class=\"table-of-contents-section has-advanced-items only-advanced-items\">");
    state.writer.line(
        "<h4 id=\"section-table-of-contents-implemented-interfaces\">Implemented Interfaces</h4>",
    );
    for interface in &document.entity.implemented_interfaces {
        state.toc_item(&TocItem::from(interface), true, false)?;
    }
    state.writer.line("</section>");
    state.writer.line("</section>");
    state.writer.line("</section>");
    Ok(())
}

fn write_see_also(state: &mut PageState<'_>) -> Result<()> {
    let document = state.document;
    let entries = document.entity.attrs().see_also();
    if entries.is_empty() {
        return Ok(());
    }

    let entities = Arc::clone(&state.ctx.entities);
    let mut items = Vec::new();
    for entry in entries {
        let found = entities.get(entry).or_else(|| {
            state.ctx.references.target(entry).and_then(|target| entities.get_by_href(target))
        });
        match found {
            Some(entity) => items.push(TocItem::from(entity)),
            None => tracing::error!(
                "Unable to resolve see-also entry for {} - no matching entity nor reference map entry: '{}'",
                document.entity.uri.href,
                entry
            ),
        }
    }
    if items.is_empty() {
        return Ok(());
    }

    tracing::debug!("Adding {} see-also entries to {}", items.len(), document.entity.uri.href);
    state.writer.line("<section class=\"see-also\">");
    state.writer.line("<section class=\"table-of-contents\">");
    state.writer.line("<section class=\"table-of-contents-section\">");
    state.writer.line("<h4 id=\"section-see-also\">See Also</h4>");
    for item in &items {
        state.toc_item(item, false, false)?;
    }
    state.writer.line("</section>");
    state.writer.line("</section>");
    state.writer.line("</section>");
    Ok(())
}
