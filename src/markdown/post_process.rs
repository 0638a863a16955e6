//! HTML post-processors applied to converted fragments.

use std::fmt::Debug;

/// A pure HTML to HTML transformation run on a fragment right after conversion.
///
/// Processors are shared between fragments and run on the blocking pool, so they must
/// be `Send + Sync` and must not depend on call order.
pub trait HtmlPostProcessor: Debug + Send + Sync {
    /// Transform converted fragment HTML.
    fn process(&self, html: &str) -> String;
}

/// Demote `h1`..`h4` to `h3`..`h6`.
///
/// API pages already use `h2`/`h3` for their own structure, so headings authored inside
/// embedded comments are pushed below them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftHeadings;

impl HtmlPostProcessor for ShiftHeadings {
    fn process(&self, html: &str) -> String {
        // Highest level first so a heading is never shifted twice.
        let mut out = html.to_string();
        for level in (1..=4).rev() {
            out = out
                .replace(&format!("<h{level}"), &format!("<h{}", level + 2))
                .replace(&format!("</h{level}"), &format!("</h{}", level + 2));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_headings() {
        let html = "<h1>A</h1><h2 id=\"b\">B</h2><h4>D</h4><h5>E</h5><h6>F</h6>";
        assert_eq!(
            ShiftHeadings.process(html),
            "<h3>A</h3><h4 id=\"b\">B</h4><h6>D</h6><h5>E</h5><h6>F</h6>"
        );
    }

    #[test]
    fn test_shift_headings_leaves_other_tags() {
        let html = "<header><hr/><p>text</p></header>";
        assert_eq!(ShiftHeadings.process(html), html);
    }
}
