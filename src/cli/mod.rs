//! Command-line interface for docweave.
//!
//! ```bash
//! # Build ./docs into ./docs/generated for a site hosted at the domain root
//! docweave ./docs https://docs.example.com/
//!
//! # Custom output directory, quality report and debug logging
//! docweave ./docs https://docs.example.com/ ./public --report --verbose
//!
//! # Warn about unresolved references instead of failing
//! docweave ./docs / --lenient
//! ```
//!
//! # Logging
//!
//! Logs go to stderr through `tracing-subscriber`. The level is `info` by default,
//! `debug` with `--verbose` and `error` with `--quiet`. A `RUST_LOG` variable, when
//! set, overrides all three.

use crate::builder::DocBuilder;
use crate::config::BuilderSettings;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default log filter, used when `RUST_LOG` is not set
    pub log_level: String,
}

impl CliConfig {
    /// Install the global tracing subscriber.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(&self.log_level)
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Generate a documentation site from API metadata and Markdown articles.
#[derive(Parser, Debug)]
#[command(
    name = "docweave",
    about = "Cross-referenced documentation site generator",
    version,
    long_about = "docweave renders API metadata (JSON) and articles (Markdown) into a linked HTML site, \
                  resolving @Keyword references, checking every internal link and writing a sitemap."
)]
pub struct Cli {
    /// Documentation source root (contains reference-map, outline, articles/ and api-docs/)
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Base URL the site is hosted at, e.g. https://docs.example.com/
    #[arg(value_name = "BASE_URL")]
    base_url: String,

    /// Output directory; deleted and recreated [default: ROOT/generated]
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Write generator-report.html listing thin documentation and unresolved references
    #[arg(long)]
    report: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Warn about unresolved references instead of failing the build
    #[arg(long, env = "DOCWEAVE_LENIENT")]
    lenient: bool,
}

impl Cli {
    /// Build a [`CliConfig`] from the parsed flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };
        CliConfig {
            log_level: log_level.to_string(),
        }
    }

    /// Initialize logging and run the build.
    ///
    /// # Errors
    ///
    /// Any error of [`BuilderSettings::new`] or [`DocBuilder::build`].
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Run the build with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let quiet = self.quiet;
        let settings = BuilderSettings::new(self.root, &self.base_url, self.output, self.report, self.lenient)?;
        let output = settings.output.clone();
        let summary = DocBuilder::new(settings).build().await?;

        if !quiet {
            println!(
                "{} Generated {} pages into {} in {:.2}s",
                "✓".green(),
                summary.pages(),
                output.display(),
                summary.elapsed.as_secs_f64()
            );
            if summary.unresolved > 0 {
                println!("{} {} unresolved reference(s), see the log above", "!".yellow(), summary.unresolved);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["docweave", "docs", "https://docs.example.com/", "public"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("docs"));
        assert_eq!(cli.base_url, "https://docs.example.com/");
        assert_eq!(cli.output, Some(PathBuf::from("public")));
        assert!(!cli.report);
    }

    #[test]
    fn test_output_is_optional() {
        let cli = Cli::try_parse_from(["docweave", "docs", "/", "--report", "--lenient"]).unwrap();
        assert_eq!(cli.output, None);
        assert!(cli.report);
        assert!(cli.lenient);
    }

    #[test]
    fn test_base_url_is_required() {
        assert!(Cli::try_parse_from(["docweave", "docs"]).is_err());
    }

    #[test]
    fn test_log_levels() {
        let cli = Cli::try_parse_from(["docweave", "docs", "/"]).unwrap();
        assert_eq!(cli.build_config().log_level, "info");

        let cli = Cli::try_parse_from(["docweave", "docs", "/", "-v"]).unwrap();
        assert_eq!(cli.build_config().log_level, "debug");

        let cli = Cli::try_parse_from(["docweave", "docs", "/", "--quiet"]).unwrap();
        assert_eq!(cli.build_config().log_level, "error");
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["docweave", "docs", "/", "-v", "-q"]).is_err());
    }
}
