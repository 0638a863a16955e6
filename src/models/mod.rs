//! Data model for API metadata and the documents built from it
//!
//! Every type here mirrors one object of the camelCase JSON export consumed from
//! `api-docs/`. Entities are constructed once by the [`loader`](crate::loader) and are
//! immutable afterwards; the only mutation is the removal of hidden table-of-contents
//! items performed at load time (see [`ApiDocument::drop_hidden_items`]).
//!
//! Optional JSON members map to `Option` or empty collections, so a sparse export
//! deserializes cleanly and absent sections are simply skipped at render time.

pub mod inheritance;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use inheritance::{InheritanceNode, InheritanceTree};

/// Composite identifier of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityId {
    /// Raw identifier, unique across the export
    pub id: String,
    /// Identifier of the owning entity (empty for top level entities)
    pub parent_id: String,
    /// Kind tag, e.g. `Class`, `Method`, `JsModule`, `AttachedUxProperty`
    #[serde(rename = "type")]
    pub kind: String,
    /// Modifier set, e.g. `public`, `abstract`
    pub modifiers: Vec<String>,
}

/// Site-relative location of an entity.
///
/// `href` is the link target and identity key; `id_uri` is a secondary identity used to
/// key quality records and to compare declared-in descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityUri {
    pub href: String,
    pub id_uri: Option<String>,
}

impl EntityUri {
    /// Identity used for quality keys, falling back to `href`.
    #[must_use]
    pub fn identity(&self) -> &str {
        self.id_uri.as_deref().filter(|s| !s.is_empty()).unwrap_or(&self.href)
    }
}

/// Title set of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Titles {
    pub page_title: String,
    pub index_title: String,
    pub fully_qualified_index_title: String,
    pub navigation_title: String,
    pub full_title: String,
}

/// Documentation comment bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Comment {
    pub brief: Option<String>,
    pub full: Option<String>,
    pub remarks: Option<String>,
    pub examples: Option<String>,
    pub ux: Option<String>,
    pub attributes: Option<CommentAttributes>,
}

impl Comment {
    /// Structured attributes, or the empty set when the comment has none.
    #[must_use]
    pub fn attrs(&self) -> CommentAttributesRef<'_> {
        CommentAttributesRef(self.attributes.as_ref())
    }
}

/// Structured attributes attached to a comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentAttributes {
    pub advanced: bool,
    pub script_module: Option<String>,
    pub script_method: Option<ScriptMethod>,
    pub script_property: Option<String>,
    pub script_event: Option<String>,
    pub returns: Option<ReturnsComment>,
    pub published: bool,
    pub topic: Option<String>,
    pub parameters: Vec<ParameterComment>,
    pub see_also: Vec<String>,
    pub deprecated: bool,
    pub experimental: bool,
    pub hidden: bool,
}

/// Borrowed view over optional comment attributes.
///
/// Lets callers ask `comment.attrs().deprecated()` without unwrapping two layers of
/// `Option` at every call site.
#[derive(Debug, Clone, Copy)]
pub struct CommentAttributesRef<'a>(Option<&'a CommentAttributes>);

impl<'a> CommentAttributesRef<'a> {
    #[must_use]
    pub fn get(self) -> Option<&'a CommentAttributes> {
        self.0
    }

    #[must_use]
    pub fn advanced(self) -> bool {
        self.0.is_some_and(|a| a.advanced)
    }

    #[must_use]
    pub fn deprecated(self) -> bool {
        self.0.is_some_and(|a| a.deprecated)
    }

    #[must_use]
    pub fn experimental(self) -> bool {
        self.0.is_some_and(|a| a.experimental)
    }

    #[must_use]
    pub fn hidden(self) -> bool {
        self.0.is_some_and(|a| a.hidden)
    }

    #[must_use]
    pub fn topic(self) -> Option<&'a str> {
        self.0.and_then(|a| non_blank(a.topic.as_deref()))
    }

    #[must_use]
    pub fn see_also(self) -> &'a [String] {
        self.0.map_or(&[], |a| a.see_also.as_slice())
    }

    /// Parameter documentation for `name`.
    #[must_use]
    pub fn parameter(self, name: &str) -> Option<&'a ParameterComment> {
        self.0.and_then(|a| a.parameters.iter().find(|p| p.name == name))
    }
}

/// `scriptMethod` comment attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptMethod {
    pub name: String,
    pub parameters: Vec<String>,
}

/// `returns` comment attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReturnsComment {
    pub type_hint: Option<String>,
    pub text: Option<String>,
}

/// Documentation of a single parameter inside a comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParameterComment {
    pub name: String,
    pub type_hint: Option<String>,
    pub description: Option<String>,
}

/// Namespace and package an entity lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub namespace_title: Option<String>,
    pub namespace_uri: Option<String>,
    pub package_name: Option<String>,
    pub package_version: Option<String>,
}

/// A declared parameter of a method, constructor or attached member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameter {
    pub name: String,
    pub href: Option<String>,
    pub is_virtual: bool,
    pub title: String,
}

/// Return or value type of a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Returns {
    pub href: Option<String>,
    pub is_virtual: bool,
    pub title: String,
}

impl Returns {
    /// Link target, unless the type is virtual or has no page.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        if self.is_virtual {
            return None;
        }
        non_blank(self.href.as_deref())
    }
}

/// Reference to an implemented interface or a base type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityRef {
    pub id: EntityId,
    pub uri: EntityUri,
    pub titles: Titles,
    pub comment: Option<Comment>,
}

/// One possible value of an enum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnumValue {
    pub uri: String,
    pub title: String,
    pub comment: Option<Comment>,
}

/// UX flags of a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flags {
    pub ux_content: bool,
    pub ux_primary: bool,
    pub ux_components: bool,
}

impl Flags {
    #[must_use]
    pub fn any(self) -> bool {
        self.ux_content || self.ux_primary || self.ux_components
    }
}

/// A source level attribute applied to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attribute {
    pub id: EntityId,
    pub uri: EntityUri,
    pub titles: Titles,
    pub parameters: Vec<String>,
}

/// A documented program element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entity {
    pub id: EntityId,
    pub uri: EntityUri,
    pub titles: Titles,
    pub comment: Option<Comment>,
    pub location: Option<Location>,
    pub base: Option<EntityRef>,
    pub inheritance: Option<InheritanceTree>,
    pub parameters: Vec<Parameter>,
    pub returns: Option<Returns>,
    pub implemented_interfaces: Vec<EntityRef>,
    pub values: Vec<EnumValue>,
    pub flags: Option<Flags>,
    pub attributes: Vec<Attribute>,
}

impl Entity {
    /// Comment attributes of this entity.
    #[must_use]
    pub fn attrs(&self) -> CommentAttributesRef<'_> {
        CommentAttributesRef(self.comment.as_ref().and_then(|c| c.attributes.as_ref()))
    }

    /// Text of a comment section if present and not blank.
    #[must_use]
    pub fn comment_text(&self, pick: impl Fn(&Comment) -> Option<&str>) -> Option<&str> {
        non_blank(self.comment.as_ref().and_then(pick))
    }
}

/// Projection of an entity for one listing row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TocItem {
    pub id: EntityId,
    pub uri: EntityUri,
    pub titles: Titles,
    pub comment: Option<Comment>,
    pub returns: Option<Returns>,
    pub parameters: Vec<Parameter>,
    pub flags: Option<Flags>,
}

impl TocItem {
    /// Comment attributes of this item.
    #[must_use]
    pub fn attrs(&self) -> CommentAttributesRef<'_> {
        CommentAttributesRef(self.comment.as_ref().and_then(|c| c.attributes.as_ref()))
    }
}

impl From<&Entity> for TocItem {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            uri: entity.uri.clone(),
            titles: entity.titles.clone(),
            comment: entity.comment.clone(),
            returns: entity.returns.clone(),
            parameters: entity.parameters.clone(),
            flags: entity.flags,
        }
    }
}

impl From<&EntityRef> for TocItem {
    fn from(entity: &EntityRef) -> Self {
        Self {
            id: entity.id.clone(),
            uri: entity.uri.clone(),
            titles: entity.titles.clone(),
            comment: entity.comment.clone(),
            ..Self::default()
        }
    }
}

/// The ancestor a table-of-contents section was declared in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclaredIn {
    pub id: EntityId,
    pub uri: EntityUri,
    pub titles: Titles,
}

/// A list of items declared by the same ancestor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TocSection {
    pub declared_in: Option<DeclaredIn>,
    pub is_attached: bool,
    pub items: Vec<TocItem>,
}

/// Table of contents of a document: category name to sections.
pub type TableOfContents = BTreeMap<String, Vec<TocSection>>;

/// A bucket of items declared by the same ancestor, the subject itself, or the
/// synthetic attached group.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredInGroup {
    /// Declared-in descriptor; `None` for the subject's own group and the attached group
    pub declared_in: Option<DeclaredIn>,
    pub items: Vec<TocItem>,
    pub attached: bool,
}

impl DeclaredInGroup {
    /// Sort items case-insensitively by index title.
    pub fn sort_items(&mut self) {
        sort_by_index_title(&mut self.items);
    }
}

/// Items of one kind category.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeGroup {
    /// Category key, e.g. `methods`
    pub key: String,
    /// Display title, e.g. `Methods`
    pub title: String,
    pub items: Vec<TocItem>,
}

/// One API metadata document: entity plus its table of contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiDocument {
    pub entity: Entity,
    pub table_of_contents: TableOfContents,
    /// Modification time of the JSON file this document came from
    #[serde(skip)]
    pub source_modified: DateTime<Utc>,
}

impl ApiDocument {
    /// Remove table-of-contents items whose comment marks them hidden.
    ///
    /// Returns the number of removed items.
    pub fn drop_hidden_items(&mut self) -> usize {
        let mut removed = 0;
        for sections in self.table_of_contents.values_mut() {
            for section in sections.iter_mut() {
                let before = section.items.len();
                section.items.retain(|item| !item.attrs().hidden());
                removed += before - section.items.len();
            }
        }
        removed
    }
}

/// Descendant list of a type, used for `[subclass ...]` embedding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiIndex {
    pub root: Entity,
    pub descendants: Vec<TocItem>,
    #[serde(skip)]
    pub source_modified: DateTime<Utc>,
}

/// Comment quality of one rendered API document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiDocumentQuality {
    pub kind: String,
    pub href: String,
    /// Fully qualified index title, used to name the document in reports
    pub qualified_title: String,
    pub comment_lines: usize,
    /// Comment lines per table-of-contents item, keyed by item identity
    pub toc_comment_lines: BTreeMap<String, usize>,
}

/// Length of one rendered article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuality {
    pub path: String,
    pub lines: usize,
}

/// Sort items case-insensitively by index title.
pub fn sort_by_index_title(items: &mut [TocItem]) {
    items.sort_by_cached_key(|item| item.titles.index_title.to_lowercase());
}

/// `Some(s)` when `s` is present and contains a non-whitespace character.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
