use super::docweave;
use docweave::test_utils::SiteFixture;
use predicates::prelude::*;

/// Test that dead links fail the build and are listed
#[test]
fn test_dead_links() {
    let site = SiteFixture::new().unwrap();
    site.write("articles/broken.md", "# Broken\n\nSee [the guide](guide.md).\n").unwrap();

    docweave(&site)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing links in file broken.html"))
        .stderr(predicate::str::contains("guide.html"))
        .stderr(predicate::str::contains("1 file(s) had in total 1 invalid/dead link(s)"));
}

/// Test that unresolved references fail by default
#[test]
fn test_unresolved_reference_strict() {
    let site = SiteFixture::new().unwrap();
    site.write("articles/typo.md", "# Typo\n\nSee @Widget.\n").unwrap();

    docweave(&site)
        .assert()
        .failure()
        .stderr(predicate::str::contains("@Widget"))
        .stderr(predicate::str::contains("1 unresolved reference(s) found"));
}

/// Test that --lenient turns unresolved references into warnings
#[test]
fn test_unresolved_reference_lenient() {
    let site = SiteFixture::new().unwrap();
    site.write("articles/typo.md", "# Typo\n\nSee @Widget.\n").unwrap();

    docweave(&site)
        .arg("--lenient")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 unresolved reference(s)"));

    let typo = site.read_output("typo.html").unwrap();
    assert!(typo.contains("See Widget."));
}

/// Test a missing source root
#[test]
fn test_missing_root() {
    let site = SiteFixture::empty().unwrap();
    let mut cmd = assert_cmd::Command::cargo_bin("docweave").unwrap();

    cmd.arg(site.root().join("nowhere"))
        .arg("/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Root directory not found"));
}

/// Test a duplicate outline link
#[test]
fn test_duplicate_outline_link() {
    let site = SiteFixture::new().unwrap();
    site.write("outline", "Home : articles/index.md\nAgain : articles/index.md\n").unwrap();

    docweave(&site)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate link found in outline on line 2"));
}

/// Test a reference map entry pointing at nothing
#[test]
fn test_unresolvable_reference_map_target() {
    let site = SiteFixture::new().unwrap();
    site.write("reference-map", "Node fuse/node\nGhost fuse/ghost\n").unwrap();

    docweave(&site)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to resolve path fuse/ghost"));
}

/// Test malformed API metadata
#[test]
fn test_malformed_metadata() {
    let site = SiteFixture::new().unwrap();
    site.write("api-docs/api/fuse/broken.json", "{ \"entity\": ").unwrap();

    docweave(&site)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse API metadata"))
        .stderr(predicate::str::contains("broken.json"));
}
