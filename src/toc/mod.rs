//! Table-of-contents organization
//!
//! An API document carries its members as a map of category name (`methods`,
//! `properties`, ...) to sections, where each section may name the ancestor type it was
//! declared in. Pages present those members in one of two shapes:
//!
//! - [`split_by_declared_in`]: one group per declaring type, the subject's own members
//!   first, then inherited members from the most derived ancestor down to the root
//!   type, with attached UX members collected in a final group. Used for type and
//!   member pages.
//! - [`split_by_type`]: one group per category in a fixed priority order. Used for
//!   namespace and root pages.

use crate::core::DocError;
use crate::models::{
    DeclaredIn, DeclaredInGroup, Entity, TableOfContents, TocItem, TypeGroup, sort_by_index_title,
};
use anyhow::Result;
use std::collections::HashMap;

/// Category keys and display titles, highest priority first.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("attachedUxProperties", "Attached UX Properties"),
    ("attachedUxEvents", "Attached UX Events"),
    ("jsModules", "JavaScript Modules"),
    ("jsProperties", "JavaScript Properties"),
    ("jsEvents", "JavaScript Events"),
    ("namespaces", "Namespaces"),
    ("uxClasses", "UX Classes"),
    ("classes", "Classes"),
    ("delegates", "Delegates"),
    ("enums", "Enums"),
    ("interfaces", "Interfaces"),
    ("structs", "Structs"),
    ("constructors", "Constructors"),
    ("properties", "Properties"),
    ("methods", "Methods"),
    ("events", "Events"),
    ("fields", "Fields"),
    ("casts", "Casts"),
    ("operators", "Operators"),
    ("literals", "Literals"),
    ("swizzlerTypes", "Swizzler Types"),
];

/// Members collected for one declaring type.
struct Bucket {
    declared_in: Option<DeclaredIn>,
    items: Vec<TocItem>,
}

/// Group the members of `entity` by the type that declared them.
///
/// Output order is the entity's own members first, then one group per ancestor from
/// the most derived to the least derived, then the attached group. Empty groups are
/// dropped and every group is sorted case-insensitively by index title. Members whose
/// declaring type does not appear in the entity's inheritance tree are not emitted.
///
/// # Errors
///
/// Returns [`DocError::MissingDeclaredIn`] if an ancestor's bucket has no declared-in
/// descriptor.
pub fn split_by_declared_in(entity: &Entity, toc: &TableOfContents) -> Result<Vec<DeclaredInGroup>> {
    let self_key = entity.uri.href.as_str();
    let ancestors = entity.inheritance.as_ref().map(|tree| tree.flatten_uris()).unwrap_or_default();

    let mut buckets: HashMap<String, Bucket> = HashMap::new();
    for sections in toc.values() {
        for section in sections {
            let key = section
                .declared_in
                .as_ref()
                .map(|d| d.uri.href.as_str())
                .filter(|href| !href.trim().is_empty())
                .unwrap_or(self_key);

            let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
                declared_in: section.declared_in.clone().filter(|d| d.id.id != entity.id.id),
                items: Vec::new(),
            });
            bucket.items.extend(section.items.iter().cloned());
        }
    }

    let mut groups = Vec::new();
    if let Some(own) = buckets.remove(self_key) {
        groups.push(DeclaredInGroup {
            declared_in: None,
            items: own.items,
            attached: false,
        });
    }

    for ancestor in ancestors.iter().rev().filter(|uri| **uri != self_key) {
        let Some(bucket) = buckets.remove(*ancestor) else {
            continue;
        };
        let Some(declared_in) = bucket.declared_in else {
            return Err(DocError::MissingDeclaredIn {
                ancestor: (*ancestor).to_string(),
                entity: self_key.to_string(),
            }
            .into());
        };
        groups.push(DeclaredInGroup {
            declared_in: Some(declared_in),
            items: bucket.items,
            attached: false,
        });
    }

    if !buckets.is_empty() {
        tracing::debug!(
            "{} declared-in groups of {} are outside its inheritance tree",
            buckets.len(),
            self_key
        );
    }

    let mut attached = Vec::new();
    for group in &mut groups {
        let (moved, kept): (Vec<_>, Vec<_>) =
            group.items.drain(..).partition(|item| item.id.kind.starts_with("Attached"));
        group.items = kept;
        attached.extend(moved);
    }
    if !attached.is_empty() {
        groups.push(DeclaredInGroup {
            declared_in: None,
            items: attached,
            attached: true,
        });
    }

    groups.retain(|group| !group.items.is_empty());
    for group in &mut groups {
        group.sort_items();
    }

    Ok(groups)
}

/// Group all members by category in [`CATEGORIES`] order.
///
/// Sections of one category are flattened into a single sorted list. Categories not
/// in the priority list are ignored.
#[must_use]
pub fn split_by_type(toc: &TableOfContents) -> Vec<TypeGroup> {
    CATEGORIES
        .iter()
        .filter_map(|(key, title)| {
            let sections = toc.get(*key)?;
            let mut items: Vec<TocItem> =
                sections.iter().flat_map(|section| section.items.iter().cloned()).collect();
            sort_by_index_title(&mut items);
            Some(TypeGroup {
                key: (*key).to_string(),
                title: (*title).to_string(),
                items,
            })
        })
        .collect()
}
