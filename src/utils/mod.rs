//! Shared helpers for HTML text, site paths and parallel work
//!
//! # Modules
//!
//! - [`html`] - HTML escaping and line counting
//! - [`paths`] - Relative link computation between output pages
//! - [`parallel`] - Running blocking work on Tokio's blocking pool
//!
//! # Example
//!
//! ```rust
//! use docweave::utils::{escape_html, relative_path};
//!
//! let href = relative_path("fuse/node.html", "fuse/visual", Some("html"));
//! let link = format!("<a href=\"{}\">{}</a>", escape_html(&href), escape_html("Visual<T>"));
//! assert_eq!(link, "<a href=\"../fuse/visual.html\">Visual&lt;T&gt;</a>");
//! ```

pub mod html;
pub mod parallel;
pub mod paths;

pub use html::{count_lines, escape_html, unescape_html};
pub use parallel::map_blocking;
pub use paths::{normalize_separators, relative_path, resolve_from, site_path};
