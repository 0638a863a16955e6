//! Title rules and advanced classification
//!
//! Entity titles in the metadata export are not always what a page should show.
//! JavaScript members are titled from their script comment attributes, constructors
//! and attached UX members get adjusted index titles, and methods that implement an
//! attached UX attribute get a descriptive page title. All of those rules live here,
//! together with the classification of members as "advanced".

use super::EntityCache;
use crate::core::DocError;
use crate::models::{Attribute, Comment, Entity, EntityId, Parameter, TableOfContents, Titles, TocItem, non_blank};
use anyhow::Result;

/// Attribute href prefix of `UXAttachedProperty`, `UXAttachedEvent` and
/// `UXAttachedMethod`.
const ATTACHED_ATTRIBUTE_PREFIX: &str = "uno/ux/uxattached";

/// Kinds that are advanced unless stated otherwise, lowercase.
const IMPLICITLY_ADVANCED: &[&str] = &[
    "class",
    "delegate",
    "enum",
    "interface",
    "struct",
    "constructor",
    "property",
    "method",
    "event",
    "field",
    "cast",
    "operator",
    "literal",
    "swizzlertype",
];

/// Which title of an entity is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleForm {
    /// Short title used in listings
    Index,
    /// Full title used as page heading
    Page,
}

/// Description of a method that implements an attached UX member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedInfo {
    /// `property`, `event` or `method`; empty if the attribute is of another kind
    pub kind: &'static str,
    pub attached_by_title: String,
    pub attached_by_href: String,
    pub attached_to_title: String,
    pub attached_to_href: Option<String>,
    /// Last segment of the attribute's registered name
    pub name: String,
    /// Registered name, e.g. `Grid.Row`
    pub full_name: String,
}

/// Attached UX information of a `Method` entity.
///
/// A method qualifies when it has at least two parameters and carries a
/// `uno/ux/uxattached*` attribute with parameters. The owning type, taken from the
/// entity cache, is what attaches the member; the first parameter's type is what it is
/// attached to.
///
/// # Errors
///
/// Returns [`DocError::MissingParent`] if the method qualifies but its parent is not in
/// the cache.
pub fn attached_info(
    id: &EntityId,
    parameters: &[Parameter],
    attributes: &[Attribute],
    cache: &EntityCache,
) -> Result<Option<AttachedInfo>> {
    let attribute = attributes
        .iter()
        .find(|a| a.uri.href.starts_with(ATTACHED_ATTRIBUTE_PREFIX) && !a.parameters.is_empty());
    let Some(attribute) = attribute else {
        return Ok(None);
    };
    if id.kind != "Method" || parameters.len() < 2 {
        return Ok(None);
    }

    let href = attribute.uri.href.as_str();
    let kind = if href.contains("uxattachedproperty") {
        "property"
    } else if href.contains("uxattachedevent") {
        "event"
    } else if href.contains("uxattachedmethod") {
        "method"
    } else {
        ""
    };

    let parent = cache.get(&id.parent_id).ok_or_else(|| DocError::MissingParent {
        id: id.id.clone(),
        parent_id: id.parent_id.clone(),
    })?;

    let full_name = attribute.parameters[0].clone();
    let name = full_name.rsplit('.').next().unwrap_or(&full_name).to_string();

    Ok(Some(AttachedInfo {
        kind,
        attached_by_title: parent.titles.index_title.clone(),
        attached_by_href: parent.uri.href.clone(),
        attached_to_title: parameters[0].title.clone(),
        attached_to_href: parameters[0].href.clone(),
        name,
        full_name,
    }))
}

/// Title of an entity or listing item in the requested form.
///
/// `attached` is only consulted for page titles.
///
/// # Errors
///
/// Returns [`DocError::MissingScriptAttribute`] for a JavaScript member whose script
/// comment attribute is missing.
pub fn title(
    id: &EntityId,
    titles: &Titles,
    comment: Option<&Comment>,
    attached: Option<&AttachedInfo>,
    form: TitleForm,
) -> Result<String> {
    let is_index = form == TitleForm::Index;
    if let (false, Some(info)) = (is_index, attached) {
        return Ok(format!("{} attached {} on {}", info.name, info.kind, info.attached_to_title));
    }

    let attributes = comment.and_then(|c| c.attributes.as_ref());
    let missing = |attribute: &str| DocError::MissingScriptAttribute {
        id: id.id.clone(),
        kind: id.kind.clone(),
        attribute: attribute.to_string(),
    };

    match id.kind.as_str() {
        "JsMethod" => {
            let method =
                attributes.and_then(|a| a.script_method.as_ref()).ok_or_else(|| missing("scriptMethod"))?;
            let name = format!("{}({})", method.name, method.parameters.join(", "));
            Ok(if is_index {
                name
            } else {
                format!("{}.{name} Method (JS)", type_name(titles))
            })
        }
        "JsModule" => {
            let module = attributes
                .and_then(|a| non_blank(a.script_module.as_deref()))
                .ok_or_else(|| missing("scriptModule"))?;
            Ok(if is_index {
                module.to_string()
            } else {
                format!("{module} Module (JS)")
            })
        }
        "JsProperty" => {
            let property = attributes
                .and_then(|a| non_blank(a.script_property.as_deref()))
                .ok_or_else(|| missing("scriptProperty"))?;
            Ok(if is_index {
                property.to_string()
            } else {
                format!("{}.{property} Property (JS)", type_name(titles))
            })
        }
        "JsEvent" => {
            let event = attributes
                .and_then(|a| non_blank(a.script_event.as_deref()))
                .ok_or_else(|| missing("scriptEvent"))?;
            Ok(if is_index {
                event.to_string()
            } else {
                format!("{}.{event} Event (JS)", type_name(titles))
            })
        }
        "Constructor" if is_index => Ok(format!("{} Constructor", titles.index_title)),
        kind if is_index && kind.starts_with("AttachedUx") => Ok(titles
            .index_title
            .split_once('.')
            .map_or_else(|| titles.index_title.clone(), |(_, rest)| rest.to_string())),
        _ if is_index => Ok(titles.index_title.clone()),
        _ => Ok(titles.page_title.clone()),
    }
}

/// Page heading of an entity, applying the attached UX rule.
///
/// # Errors
///
/// See [`attached_info`] and [`title`].
pub fn page_title(entity: &Entity, cache: &EntityCache) -> Result<String> {
    let attached = attached_info(&entity.id, &entity.parameters, &entity.attributes, cache)?;
    title(&entity.id, &entity.titles, entity.comment.as_ref(), attached.as_ref(), TitleForm::Page)
}

/// Listing title of a table-of-contents item.
///
/// # Errors
///
/// See [`title`].
pub fn index_title(item: &TocItem) -> Result<String> {
    title(&item.id, &item.titles, item.comment.as_ref(), None, TitleForm::Index)
}

/// Name of the declaring type, taken from the fully qualified index title.
///
/// Arguments are stripped and the second to last dotted segment is kept, so
/// `Fuse.Elements.Element.Equals(Fuse.Elements.Element other)` yields `Element`.
#[must_use]
pub fn type_name(titles: &Titles) -> &str {
    let qualified = titles.fully_qualified_index_title.as_str();
    let head = qualified.split_once('(').map_or(qualified, |(head, _)| head);
    let segments: Vec<&str> = head.split('.').collect();
    if segments.len() >= 2 { segments[segments.len() - 2] } else { head }
}

/// Whether `item` is hidden behind the "Show advanced things" toggle on the page of
/// `page`.
#[must_use]
pub fn is_advanced(item: &TocItem, page: Option<&EntityId>) -> bool {
    let kind = item.id.kind.to_lowercase();
    if IMPLICITLY_ADVANCED.contains(&kind.as_str()) || item.attrs().advanced() {
        return true;
    }
    // Only JavaScript members are basic on a JavaScript module page
    page.is_some_and(|p| p.kind == "JsModule") && !item.id.kind.starts_with("Js")
}

/// Whether every item in `toc` is advanced. True for an empty table of contents.
#[must_use]
pub fn has_only_advanced(toc: &TableOfContents, page: &EntityId) -> bool {
    toc.values()
        .flatten()
        .flat_map(|section| section.items.iter())
        .all(|item| is_advanced(item, Some(page)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApiDocument, CommentAttributes, EntityUri, ScriptMethod, TocSection};
    use crate::render::test_support::entity;

    fn id(id: &str, kind: &str, parent: &str) -> EntityId {
        EntityId {
            id: id.to_string(),
            parent_id: parent.to_string(),
            kind: kind.to_string(),
            modifiers: Vec::new(),
        }
    }

    fn titles(index: &str, page: &str, qualified: &str) -> Titles {
        Titles {
            page_title: page.to_string(),
            index_title: index.to_string(),
            fully_qualified_index_title: qualified.to_string(),
            ..Titles::default()
        }
    }

    fn comment(attributes: CommentAttributes) -> Comment {
        Comment {
            attributes: Some(attributes),
            ..Comment::default()
        }
    }

    #[test]
    fn test_type_name() {
        let t = titles("", "", "Fuse.Elements.Element.Equals(Fuse.Elements.Element other)");
        assert_eq!(type_name(&t), "Element");
        assert_eq!(type_name(&titles("", "", "Node")), "Node");
    }

    #[test]
    fn test_js_method_titles() {
        let c = comment(CommentAttributes {
            script_method: Some(ScriptMethod {
                name: "goto".to_string(),
                parameters: vec!["node".to_string(), "animate".to_string()],
            }),
            ..CommentAttributes::default()
        });
        let id = id("Fuse.Router.Goto", "JsMethod", "Fuse.Router");
        let t = titles("Goto", "Goto Method", "Fuse.Router.Goto(object[])");

        assert_eq!(title(&id, &t, Some(&c), None, TitleForm::Index).unwrap(), "goto(node, animate)");
        assert_eq!(
            title(&id, &t, Some(&c), None, TitleForm::Page).unwrap(),
            "Router.goto(node, animate) Method (JS)"
        );
    }

    #[test]
    fn test_js_titles_require_script_attributes() {
        let t = titles("X", "X", "A.X");
        for kind in ["JsMethod", "JsModule", "JsProperty", "JsEvent"] {
            let err = title(&id("A.X", kind, "A"), &t, None, None, TitleForm::Index).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DocError>(),
                Some(DocError::MissingScriptAttribute { .. })
            ));
        }
    }

    #[test]
    fn test_js_module_property_event_titles() {
        let t = titles("X", "X", "Fuse.Storage.X");
        let module = comment(CommentAttributes {
            script_module: Some("FuseJS/Storage".to_string()),
            ..CommentAttributes::default()
        });
        let property = comment(CommentAttributes {
            script_property: Some("value".to_string()),
            ..CommentAttributes::default()
        });
        let event = comment(CommentAttributes {
            script_event: Some("changed".to_string()),
            ..CommentAttributes::default()
        });

        let page = |kind, c: &Comment| title(&id("x", kind, ""), &t, Some(c), None, TitleForm::Page).unwrap();
        assert_eq!(page("JsModule", &module), "FuseJS/Storage Module (JS)");
        assert_eq!(page("JsProperty", &property), "Storage.value Property (JS)");
        assert_eq!(page("JsEvent", &event), "Storage.changed Event (JS)");
    }

    #[test]
    fn test_constructor_and_attached_index_titles() {
        let ctor = id("A..ctor", "Constructor", "A");
        let t = titles("Button", "Button Constructor (string)", "Fuse.Controls.Button()");
        assert_eq!(title(&ctor, &t, None, None, TitleForm::Index).unwrap(), "Button Constructor");
        assert_eq!(title(&ctor, &t, None, None, TitleForm::Page).unwrap(), "Button Constructor (string)");

        let attached = id("Grid.Row", "AttachedUxProperty", "Grid");
        let t = titles("Grid.Row", "Grid.Row Attached Property", "Fuse.Grid.Row");
        assert_eq!(title(&attached, &t, None, None, TitleForm::Index).unwrap(), "Row");
    }

    #[test]
    fn test_attached_info_page_title() {
        let grid = entity("Fuse.Layouts.Grid", "Class", "fuse/layouts/grid", "Grid");
        let cache = EntityCache::new(vec![ApiDocument {
            entity: grid,
            ..ApiDocument::default()
        }]);

        let mut method = entity("Fuse.Layouts.Grid.SetRow", "Method", "fuse/layouts/grid/setrow", "SetRow");
        method.id.parent_id = "Fuse.Layouts.Grid".to_string();
        method.parameters = vec![
            Parameter {
                name: "elm".to_string(),
                href: Some("fuse/visual".to_string()),
                is_virtual: false,
                title: "Visual".to_string(),
            },
            Parameter {
                name: "row".to_string(),
                title: "int".to_string(),
                ..Parameter::default()
            },
        ];
        method.attributes = vec![Attribute {
            uri: EntityUri {
                href: "uno/ux/uxattachedpropertysetterattribute".to_string(),
                id_uri: None,
            },
            parameters: vec!["Grid.Row".to_string()],
            ..Attribute::default()
        }];

        let info = attached_info(&method.id, &method.parameters, &method.attributes, &cache)
            .unwrap()
            .unwrap();
        assert_eq!(info.kind, "property");
        assert_eq!(info.name, "Row");
        assert_eq!(info.attached_by_href, "fuse/layouts/grid");
        assert_eq!(page_title(&method, &cache).unwrap(), "Row attached property on Visual");

        method.id.parent_id = "Elsewhere".to_string();
        let err = page_title(&method, &cache).unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::MissingParent { .. })));
    }

    #[test]
    fn test_is_advanced() {
        let item = |kind: &str| TocItem {
            id: id("x", kind, ""),
            ..TocItem::default()
        };
        let module = id("m", "JsModule", "");

        assert!(is_advanced(&item("Method"), None));
        assert!(!is_advanced(&item("UxProperty"), None));
        assert!(!is_advanced(&item("JsMethod"), Some(&module)));
        assert!(is_advanced(&item("UxProperty"), Some(&module)));

        let mut flagged = item("UxEvent");
        flagged.comment = Some(comment(CommentAttributes {
            advanced: true,
            ..CommentAttributes::default()
        }));
        assert!(is_advanced(&flagged, None));
    }

    #[test]
    fn test_has_only_advanced() {
        let page = id("p", "Class", "");
        let mut toc = TableOfContents::new();
        assert!(has_only_advanced(&toc, &page));

        toc.insert(
            "methods".to_string(),
            vec![TocSection {
                items: vec![TocItem {
                    id: id("a", "Method", ""),
                    ..TocItem::default()
                }],
                ..TocSection::default()
            }],
        );
        assert!(has_only_advanced(&toc, &page));

        toc.insert(
            "uxProperties".to_string(),
            vec![TocSection {
                items: vec![TocItem {
                    id: id("b", "UxProperty", ""),
                    ..TocItem::default()
                }],
                ..TocSection::default()
            }],
        );
        assert!(!has_only_advanced(&toc, &page));
    }
}
