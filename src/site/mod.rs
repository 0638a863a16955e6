//! Site assembly: navigation, layout, link checking and build outputs
//!
//! Everything that happens after drafting lives here. The builder loads the
//! [`outline`] and [`layout`] once, then every draft is finished by an
//! [`output::Finalizer`] which splices fragments, resolves links, applies the layout
//! and writes the page. Once all pages are written the sitemap and, when requested,
//! the [`report`] are produced.
//!
//! # Modules
//!
//! - [`outline`] - `title : link` outline file to nested navigation list
//! - [`layout`] - Tera page layout
//! - [`links`] - anchor collection, `articles:`/`api:` links and dead link detection
//! - [`output`] - page finalization, sitemap and output directory handling
//! - [`report`] - documentation quality report

pub mod layout;
pub mod links;
pub mod outline;
pub mod output;
pub mod report;

pub use layout::Layout;
pub use links::{LinkVerifier, collect_links, rewrite_prefixed_links};
pub use outline::{build_outline, load_outline};
pub use output::{Finalizer, FinishedPage, reset_output_dir, write_sitemap};
pub use report::QualityReport;
