//! Documentation source trees for tests
//!
//! [`SiteFixture`] lays out a small but complete source root in a temporary directory:
//! two articles, one API document, a reference map, an outline and a layout. Tests
//! add or overwrite files to provoke the failure they are interested in.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const REFERENCE_MAP: &str = "\
// keyword target
Node fuse/node
intro basics/intro
";

pub const OUTLINE: &str = "\
Home : articles/index.md
\tIntroduction : articles/basics/intro.md
API : api-docs/api/fuse/node.json
";

pub const LAYOUT: &str = "\
<!DOCTYPE html>
<html>
<head><title>{{ title }}</title><base href=\"{{ base_url }}\"></head>
<body>
<nav>{{ navigation }}</nav>
<main>{{ body }}</main>
</body>
</html>
";

pub const INDEX_ARTICLE: &str = "\
# Welcome

The @Node class is the base of everything on screen.

Start with [the introduction](basics/intro.md).
";

pub const INTRO_ARTICLE: &str = "\
# Introduction

Go back [home](../index.md) or read about `@Node` in code.

Keep going.
";

pub const NODE_DOCUMENT: &str = r#"{
    "entity": {
        "id": { "id": "Fuse.Node", "parentId": "Fuse", "type": "Class", "modifiers": ["public", "abstract"] },
        "uri": { "href": "fuse/node", "idUri": "fuse/node" },
        "titles": {
            "pageTitle": "Node Class",
            "indexTitle": "Node",
            "fullyQualifiedIndexTitle": "Fuse.Node"
        },
        "comment": {
            "brief": "Base class of all nodes.",
            "full": "Base class of all nodes.\n\nNodes form the visual tree.\n\nSee also @intro."
        },
        "location": { "packageName": "Fuse.Nodes", "packageVersion": "1.0.0" }
    },
    "tableOfContents": {}
}"#;

/// A documentation source root in a temporary directory.
#[derive(Debug)]
pub struct SiteFixture {
    temp: TempDir,
}

impl SiteFixture {
    /// A complete, valid site.
    pub fn new() -> Result<Self> {
        let fixture = Self::empty()?;
        fixture.write("reference-map", REFERENCE_MAP)?;
        fixture.write("outline", OUTLINE)?;
        fixture.write("layout.html", LAYOUT)?;
        fixture.write("articles/index.md", INDEX_ARTICLE)?;
        fixture.write("articles/basics/intro.md", INTRO_ARTICLE)?;
        fixture.write("api-docs/api/fuse/node.json", NODE_DOCUMENT)?;
        fixture.create_dir("api-docs/indices")?;
        Ok(fixture)
    }

    /// An empty source root.
    pub fn empty() -> Result<Self> {
        Ok(Self {
            temp: TempDir::new().context("Failed to create temp directory")?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Default output directory of a build of this root.
    pub fn output(&self) -> PathBuf {
        self.root().join("generated")
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn create_dir(&self, relative: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        fs::create_dir_all(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(path)
    }

    /// Read a generated file below the default output directory.
    pub fn read_output(&self, relative: &str) -> Result<String> {
        let path = self.output().join(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
