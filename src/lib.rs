//! docweave - cross-referenced documentation site generator
//!
//! Builds a static HTML documentation site from two kinds of sources:
//!
//! - **API metadata**: one camelCase JSON document per program element (type, member,
//!   namespace) under `api-docs/api`, plus descendant indices under `api-docs/indices`
//! - **Articles**: Markdown files under `articles/`
//!
//! Pages link to each other through `@Keyword` references looked up in a reference map,
//! and through `articles:`/`api:` prefixed links. Every internal link is verified, and a
//! build with dead links fails.
//!
//! # Architecture Overview
//!
//! A build is a fixed sequence of phases run by [`builder::DocBuilder`]:
//!
//! 1. Sources are loaded in parallel
//! 2. Every page is drafted; Markdown is not converted yet but queued, leaving a
//!    placeholder in the draft
//! 3. The queue is flushed, converting all Markdown in one parallel batch
//! 4. Converted fragments are spliced into their drafts, references resolved, links
//!    checked, the layout applied and the pages written
//!
//! # Core Modules
//!
//! ## Engine
//! - [`references`] - keyword cross-reference resolution
//! - [`markdown`] - Markdown conversion and the deferred render queue
//! - [`toc`] - grouping of API members by declaring type or by kind
//! - [`render`] - API document and article drafting
//!
//! ## Inputs and Outputs
//! - [`loader`] - API metadata loading
//! - [`site`] - outline, layout, link verification, page output, sitemap, report
//! - [`models`] - metadata model
//!
//! ## Supporting Modules
//! - [`builder`] - phase orchestration
//! - [`cli`] - command-line interface
//! - [`config`] - build settings and `docweave.toml`
//! - [`core`] - error types and user-facing error formatting
//! - [`utils`] - HTML, path and parallelism helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use docweave::builder::DocBuilder;
//! use docweave::config::BuilderSettings;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let settings = BuilderSettings::new("docs", "https://docs.example.com/", None, true, false)?;
//! let summary = DocBuilder::new(settings).build().await?;
//! println!("{} pages written", summary.pages());
//! # Ok(())
//! # }
//! ```

// Orchestration
pub mod builder;
pub mod cli;
pub mod config;
pub mod core;

// Document assembly engine
pub mod markdown;
pub mod references;
pub mod render;
pub mod toc;

// Inputs and outputs
pub mod loader;
pub mod models;
pub mod site;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
