use super::docweave;
use docweave::test_utils::SiteFixture;
use predicates::prelude::*;

/// Test a full build of a valid site
#[test]
fn test_build_site() {
    let site = SiteFixture::new().unwrap();

    docweave(&site)
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 3 pages"));

    let index = site.read_output("index.html").unwrap();
    assert!(index.contains("<title>Welcome - Documentation</title>"));
    assert!(index.contains("<a href=\"fuse/node.html\">Node</a>"));
    assert!(index.contains("<h1 id=\"welcome\">Welcome</h1>"));
    assert!(index.contains("outline-nav-level-0"));

    let node = site.read_output("fuse/node.html").unwrap();
    assert!(node.contains("Base class of all nodes."));
    assert!(node.contains("<dd>Fuse.Nodes 1.0.0</dd>"));

    let sitemap = site.read_output("sitemap.xml").unwrap();
    assert!(sitemap.contains("<loc>https://docs.example.com/basics/intro.html</loc>"));
    assert!(sitemap.contains("<changefreq>daily</changefreq>"));
}

/// Test the output directory argument and the quality report
#[test]
fn test_custom_output_with_report() {
    let site = SiteFixture::new().unwrap();
    let output = site.root().join("public");

    docweave(&site).arg(&output).arg("--report").assert().success();

    assert!(output.join("index.html").is_file());
    assert!(!site.output().exists());

    let report = std::fs::read_to_string(output.join("generator-report.html")).unwrap();
    assert!(report.contains("Generator report"));
    assert!(report.contains("No reference map lookup failures detected."));
    assert!(report.contains("No low quality API documentation found."));
    assert!(report.contains("No low quality articles found."));
}

/// Test site configuration from docweave.toml
#[test]
fn test_site_config() {
    let site = SiteFixture::new().unwrap();
    site.write(
        "docweave.toml",
        r#"
site_title = "Fuse Docs"

[[legacy_links]]
prefix = "/examples/"
replacement = "https://examples.example.com/"
"#,
    )
    .unwrap();
    site.write("articles/samples.md", "# Samples\n\nBrowse [all samples](/examples/index.html).\n").unwrap();

    docweave(&site).assert().success();

    let samples = site.read_output("samples.html").unwrap();
    assert!(samples.contains("<title>Samples - Fuse Docs</title>"));
    assert!(samples.contains("<a href=\"https://examples.example.com/index.html\">all samples</a>"));
}

/// Test that --quiet suppresses the summary
#[test]
fn test_quiet() {
    let site = SiteFixture::new().unwrap();

    docweave(&site).env_remove("RUST_LOG").arg("--quiet").assert().success().stdout(predicate::str::is_empty());
}
