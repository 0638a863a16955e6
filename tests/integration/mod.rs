//! Integration test suite for docweave
//!
//! End-to-end tests that run the `docweave` binary against documentation source
//! trees built with [`docweave::test_utils::SiteFixture`].
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **build**: successful builds and the files they produce
//! - **errors**: failures surfaced to the user with exit code 1

mod build;
mod errors;

use assert_cmd::Command;
use docweave::test_utils::SiteFixture;

/// `docweave ROOT BASE_URL` for `site`, with logging pinned to `info`.
pub fn docweave(site: &SiteFixture) -> Command {
    let mut cmd = Command::cargo_bin("docweave").unwrap();
    cmd.env("RUST_LOG", "info").env_remove("DOCWEAVE_LENIENT").arg(site.root()).arg("https://docs.example.com/");
    cmd
}
