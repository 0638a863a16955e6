//! Documentation quality report
//!
//! `generator-report.html` lists API documents with thin comments, short articles and
//! every reference that could not be resolved, so authors know where to spend time.

use crate::models::{ApiDocumentQuality, ArticleQuality};
use crate::utils::escape_html;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::Path;

/// Fewer comment lines than this marks a document or member as low quality.
pub const MIN_COMMENT_LINES: usize = 4;

/// Fewer lines than this marks an article as low quality.
pub const MIN_ARTICLE_LINES: usize = 4;

/// Member kinds that are judged through their owning type instead.
const EXCLUDED_KINDS: &[&str] = &[
    "Constructor",
    "Property",
    "UxProperty",
    "Method",
    "Event",
    "UxEvent",
    "Field",
    "Cast",
    "Operator",
    "Literal",
];

const MAX_NAME_LENGTH: usize = 100;

/// Everything the report is built from.
#[derive(Debug, Clone, Default)]
pub struct QualityReport {
    pub documents: Vec<ApiDocumentQuality>,
    pub articles: Vec<ArticleQuality>,
    /// Unresolved reference to the pages it appeared in
    pub unresolved: BTreeMap<String, Vec<String>>,
}

impl QualityReport {
    /// Render the report as a standalone HTML page.
    #[must_use]
    pub fn render(&self, generated_at: DateTime<Local>) -> String {
        let mut out = ReportWriter::default();
        out.line("<!DOCTYPE html>");
        out.line("<html lang=\"en\">");
        out.line("<head>");
        out.line("<meta charset=\"utf-8\">");
        out.line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
        out.line("<title>Generator report</title>");
        out.line("</head>");
        out.line("<body>");
        out.line("<div class=\"container\">");
        out.line("<div class=\"jumbotron\">");
        out.line("<h1>Generator report</h1>");
        out.line(format!("<p class=\"lead\">Generated at {}</p>", generated_at.format("%Y-%m-%d %H:%M:%S")));
        out.line("</div>");

        self.write_documents(&mut out);
        self.write_articles(&mut out);
        self.write_unresolved(&mut out);

        out.line("</div>");
        out.line("</body>");
        out.line("</html>");
        out.0
    }

    /// API documents of kinds not in the excluded list whose own comment or any
    /// member's comment is shorter than [`MIN_COMMENT_LINES`], in href order.
    #[must_use]
    pub fn low_quality_documents(&self) -> Vec<&ApiDocumentQuality> {
        let mut found: Vec<&ApiDocumentQuality> = self
            .documents
            .iter()
            .filter(|d| !EXCLUDED_KINDS.contains(&d.kind.as_str()))
            .filter(|d| {
                d.comment_lines < MIN_COMMENT_LINES
                    || d.toc_comment_lines.values().any(|&lines| lines < MIN_COMMENT_LINES)
            })
            .collect();
        found.sort_by(|a, b| a.href.cmp(&b.href));
        found
    }

    /// Articles shorter than [`MIN_ARTICLE_LINES`], in path order.
    #[must_use]
    pub fn low_quality_articles(&self) -> Vec<&ArticleQuality> {
        let mut found: Vec<&ArticleQuality> =
            self.articles.iter().filter(|a| a.lines < MIN_ARTICLE_LINES).collect();
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found
    }

    fn write_documents(&self, out: &mut ReportWriter) {
        out.line("<h2>Low quality API documentation</h2>");
        let documents = self.low_quality_documents();
        if documents.is_empty() {
            out.line("<div class=\"alert alert-success\">No low quality API documentation found.</div>");
            return;
        }

        out.line(format!(
            "<div class=\"alert alert-warning\">{} data types had low quality documentation.</div>",
            documents.len()
        ));
        out.table_start("Data Type");
        for (index, document) in documents.iter().enumerate() {
            out.line("<tr>");
            out.line(format!("<td>{index}</td>"));
            out.line("<td>");
            out.line(format!(
                "<a href=\"{}.html\">{}</a>",
                escape_html(&document.href),
                escape_html(&truncate_name(&document.qualified_title))
            ));
            out.line(format!("<span class=\"label label-default\">{}</span>", escape_html(&document.kind)));
            out.line("</td>");
            out.line("<td>");
            out.line("<ul>");
            match document.comment_lines {
                0 => out.line("<li>No docs available.</li>"),
                n if n < MIN_COMMENT_LINES => out.line(format!("<li>Only {n} lines of docs available.</li>")),
                _ => {}
            }
            let missing = document.toc_comment_lines.values().filter(|&&n| n == 0).count();
            if missing > 0 {
                out.line(format!("<li>{missing} nested items had no docs available.</li>"));
            }
            let poor = document.toc_comment_lines.values().filter(|&&n| n > 0 && n < MIN_COMMENT_LINES).count();
            if poor > 0 {
                out.line(format!(
                    "<li>{poor} nested items had less than {MIN_COMMENT_LINES} lines of docs.</li>"
                ));
            }
            out.line("</ul>");
            out.line("</td>");
            out.line("</tr>");
        }
        out.table_end();
    }

    fn write_articles(&self, out: &mut ReportWriter) {
        out.line("<h2>Low quality articles</h2>");
        let articles = self.low_quality_articles();
        if articles.is_empty() {
            out.line("<div class=\"alert alert-success\">No low quality articles found.</div>");
            return;
        }

        out.line(format!(
            "<div class=\"alert alert-warning\">{} articles had low quality content.</div>",
            articles.len()
        ));
        out.table_start("Path");
        for article in articles {
            let path = escape_html(&article.path);
            out.line("<tr>");
            out.line(format!("<td><a href=\"{path}\">{path}</a></td>"));
            out.line("<td>");
            out.line("<ul>");
            match article.lines {
                0 => out.line("<li>No content available.</li>"),
                n => out.line(format!("<li>Only {n} lines of content available.</li>")),
            }
            out.line("</ul>");
            out.line("</td>");
            out.line("</tr>");
        }
        out.table_end();
    }

    fn write_unresolved(&self, out: &mut ReportWriter) {
        out.line("<h2>Reference map lookups</h2>");
        if self.unresolved.is_empty() {
            out.line("<div class=\"alert alert-success\">No reference map lookup failures detected.</div>");
            return;
        }

        let total: usize = self.unresolved.values().map(Vec::len).sum();
        out.line(format!(
            "<div class=\"alert alert-warning\">{total} reference map lookup failures detected.</div>"
        ));
        out.line("<table class=\"table table-bordered table-striped table-condensed\">");
        out.line("<thead>");
        out.line("<tr>");
        out.line("<th>Keyword</th>");
        out.line("<th>Referenced in</th>");
        out.line("</tr>");
        out.line("</thead>");
        out.line("<tbody>");

        let mut keywords: Vec<&String> = self.unresolved.keys().collect();
        keywords.sort_by_cached_key(|k| k.to_lowercase());
        for keyword in keywords {
            out.line("<tr>");
            out.line(format!("<td>{}</td>", escape_html(keyword)));
            out.line("<td>");
            out.line("<ul>");
            for path in &self.unresolved[keyword] {
                let path = escape_html(path);
                out.line(format!("<li><a href=\"{path}\">{path}</a></li>"));
            }
            out.line("</ul>");
            out.line("</td>");
            out.line("</tr>");
        }
        out.table_end();
    }

    /// Write the report to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        tracing::info!("Generating report at {}", path.display());
        std::fs::write(path, self.render(Local::now()))
            .with_context(|| format!("Failed to write report {}", path.display()))
    }
}

/// Keep the last 100 characters of long names, prefixed with `...`.
fn truncate_name(name: &str) -> String {
    let count = name.chars().count();
    if count <= MAX_NAME_LENGTH {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - MAX_NAME_LENGTH).collect();
    format!("...{tail}")
}

#[derive(Default)]
struct ReportWriter(String);

impl ReportWriter {
    fn line(&mut self, text: impl AsRef<str>) {
        self.0.push_str(text.as_ref());
        self.0.push('\n');
    }

    fn table_start(&mut self, first_column: &str) {
        self.line("<table class=\"table table-bordered table-striped table-condensed\">");
        self.line("<thead>");
        self.line("<tr>");
        self.line(format!("<th>{first_column}</th>"));
        self.line("<th>Quality Info</th>");
        self.line("</tr>");
        self.line("</thead>");
        self.line("<tbody>");
    }

    fn table_end(&mut self) {
        self.line("</tbody>");
        self.line("</table>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn document(kind: &str, href: &str, comment_lines: usize, toc: &[usize]) -> ApiDocumentQuality {
        ApiDocumentQuality {
            kind: kind.to_string(),
            href: href.to_string(),
            qualified_title: href.replace('/', "."),
            comment_lines,
            toc_comment_lines: toc.iter().enumerate().map(|(i, n)| (format!("{href}/m{i}"), *n)).collect(),
        }
    }

    fn generated_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_low_quality_documents() {
        let report = QualityReport {
            documents: vec![
                document("Class", "fuse/visual", 10, &[0, 2, 8]),
                document("Class", "fuse/node", 1, &[]),
                document("Class", "fuse/good", 10, &[5]),
                document("Method", "fuse/node/dispose", 0, &[]),
            ],
            ..QualityReport::default()
        };

        let low = report.low_quality_documents();
        let hrefs: Vec<_> = low.iter().map(|d| d.href.as_str()).collect();
        assert_eq!(hrefs, ["fuse/node", "fuse/visual"]);

        let html = report.render(generated_at());
        assert!(html.contains("2 data types had low quality documentation."));
        assert!(html.contains("<li>Only 1 lines of docs available.</li>"));
        assert!(html.contains("<li>1 nested items had no docs available.</li>"));
        assert!(html.contains("<li>1 nested items had less than 4 lines of docs.</li>"));
        assert!(html.contains("<a href=\"fuse/visual.html\">fuse.visual</a>"));
        assert!(html.contains("Generated at 2024-05-01 10:30:00"));
    }

    #[test]
    fn test_articles_and_unresolved() {
        let mut unresolved = BTreeMap::new();
        unresolved.insert("@beta".to_string(), vec!["b.html".to_string()]);
        unresolved.insert("@Alpha".to_string(), vec!["a.html".to_string(), "c.html".to_string()]);
        let report = QualityReport {
            articles: vec![
                ArticleQuality {
                    path: "short.html".to_string(),
                    lines: 2,
                },
                ArticleQuality {
                    path: "long.html".to_string(),
                    lines: 40,
                },
            ],
            unresolved,
            ..QualityReport::default()
        };

        let html = report.render(generated_at());
        assert!(html.contains("No low quality API documentation found."));
        assert!(html.contains("1 articles had low quality content."));
        assert!(html.contains("<li>Only 2 lines of content available.</li>"));
        assert!(!html.contains("long.html"));
        assert!(html.contains("3 reference map lookup failures detected."));
        assert!(html.find("@Alpha").unwrap() < html.find("@beta").unwrap());
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Fuse.Node"), "Fuse.Node");
        let long = "x".repeat(120);
        let truncated = truncate_name(&long);
        assert!(truncated.starts_with("..."));
        assert_eq!(truncated.len(), 103);
    }
}
