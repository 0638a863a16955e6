//! Test utilities for docweave
//!
//! Available to unit tests and, through the `test-utils` feature, to the integration
//! suite.
//!
//! - [`SiteFixture`] - a complete documentation source root in a temporary directory
//! - [`init_test_logging`] - tracing output for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use docweave::test_utils::SiteFixture;
//!
//! let site = SiteFixture::new().unwrap();
//! site.write("articles/extra.md", "# Extra\n").unwrap();
//! assert!(site.root().join("reference-map").exists());
//! ```

pub mod fixtures;

pub use fixtures::SiteFixture;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with neither set no
/// subscriber is installed.
///
/// To enable logging in tests via environment variable:
/// ```bash
/// RUST_LOG=docweave=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
