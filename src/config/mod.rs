//! Build configuration for docweave
//!
//! Configuration comes from two layers:
//!
//! 1. **Command line** - source root, base URL, output directory and flags, collected in
//!    [`BuilderSettings`]
//! 2. **Site file** (`<root>/docweave.toml`, optional) - presentation and strictness
//!    settings, parsed into [`SiteConfig`]
//!
//! Command line flags win over the site file where both speak about the same thing
//! (currently only reference strictness).
//!
//! # Site File
//!
//! ```toml
//! site_title = "Fuse Documentation"
//! layout = "templates/layout.html"
//! strict_references = true
//!
//! [[legacy_links]]
//! prefix = "/examples/"
//! replacement = "https://examples.fusetools.com/"
//! ```
//!
//! # Source Layout
//!
//! ```text
//! <root>/reference-map
//! <root>/outline
//! <root>/layout.html
//! <root>/articles/**.md
//! <root>/api-docs/api/**.json
//! <root>/api-docs/indices/**.json
//! ```

mod parser;

pub use parser::parse_config;

use crate::core::DocError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional site configuration file inside the source root.
pub const SITE_CONFIG_FILE: &str = "docweave.toml";

const DEFAULT_SITE_TITLE: &str = "Documentation";

/// A legacy absolute link prefix and what to rewrite it to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyLink {
    pub prefix: String,
    pub replacement: String,
}

/// Contents of `docweave.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Suffix of every page title; defaults to "Documentation"
    pub site_title: Option<String>,
    /// Layout template path relative to the source root; defaults to `layout.html`
    pub layout: Option<String>,
    /// Whether unresolved references fail the build; defaults to `true`
    pub strict_references: Option<bool>,
    /// Absolute link prefixes rewritten during post-processing
    pub legacy_links: Vec<LegacyLink>,
}

impl SiteConfig {
    /// Load `docweave.toml` from `root`, or the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(SITE_CONFIG_FILE);
        if !path.exists() {
            tracing::debug!("No {} found in {}, using defaults", SITE_CONFIG_FILE, root.display());
            return Ok(Self::default());
        }

        let config: Self = parse_config(&path)?;
        for link in &config.legacy_links {
            if link.prefix.is_empty() {
                return Err(DocError::ConfigError {
                    message: format!("legacy_links entry with empty prefix in {}", path.display()),
                }
                .into());
            }
        }
        Ok(config)
    }

    /// Site title used as page title suffix.
    #[must_use]
    pub fn site_title(&self) -> &str {
        self.site_title.as_deref().filter(|t| !t.trim().is_empty()).unwrap_or(DEFAULT_SITE_TITLE)
    }
}

/// Everything one build needs to know about its inputs and outputs.
#[derive(Debug, Clone)]
pub struct BuilderSettings {
    /// Documentation source root
    pub root: PathBuf,
    /// Base URL of the hosted site, always ending in `/`
    pub base_url: String,
    /// Output directory; deleted and recreated by every build
    pub output: PathBuf,
    /// Whether to write `generator-report.html`
    pub report: bool,
    /// Whether unresolved references fail the build
    pub strict_references: bool,
    /// Parsed site file
    pub site: SiteConfig,
}

impl BuilderSettings {
    /// Validate the source root and assemble settings.
    ///
    /// `output` defaults to `<root>/generated`. `lenient` forces non-strict reference
    /// handling regardless of the site file.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::RootNotFound`] if `root` is not a directory, or an error from
    /// parsing `docweave.toml`.
    pub fn new(
        root: impl Into<PathBuf>,
        base_url: &str,
        output: Option<PathBuf>,
        report: bool,
        lenient: bool,
    ) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(DocError::RootNotFound {
                path: root.display().to_string(),
            }
            .into());
        }
        let root = std::path::absolute(&root).unwrap_or(root);

        let site = SiteConfig::load(&root)?;
        let strict_references = !lenient && site.strict_references.unwrap_or(true);
        let output = output.unwrap_or_else(|| root.join("generated"));

        let mut base_url = base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            root,
            base_url,
            output,
            report,
            strict_references,
            site,
        })
    }

    #[must_use]
    pub fn articles_dir(&self) -> PathBuf {
        self.root.join("articles")
    }

    #[must_use]
    pub fn api_dir(&self) -> PathBuf {
        self.root.join("api-docs").join("api")
    }

    #[must_use]
    pub fn indices_dir(&self) -> PathBuf {
        self.root.join("api-docs").join("indices")
    }

    #[must_use]
    pub fn reference_map_path(&self) -> PathBuf {
        self.root.join("reference-map")
    }

    #[must_use]
    pub fn outline_path(&self) -> PathBuf {
        self.root.join("outline")
    }

    #[must_use]
    pub fn layout_path(&self) -> PathBuf {
        self.root.join(self.site.layout.as_deref().unwrap_or("layout.html"))
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.output.join("generator-report.html")
    }
}
