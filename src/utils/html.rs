//! Small HTML text helpers shared by every renderer.

/// Escape `&`, `"`, `<` and `>` for use in text and attribute values.
///
/// Every character is escaped independently, so existing entities are escaped again:
/// `&amp;` becomes `&amp;amp;`.
///
/// # Examples
///
/// ```rust
/// use docweave::utils::escape_html;
///
/// assert_eq!(escape_html(r#"List<T> & "x""#), "List&lt;T&gt; &amp; &quot;x&quot;");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_html`].
#[must_use]
pub fn unescape_html(html: &str) -> String {
    html.replace("&gt;", ">").replace("&lt;", "<").replace("&quot;", "\"").replace("&amp;", "&")
}

/// Number of lines in `text`, treating `\r\n`, `\r` and `\n` as line breaks.
///
/// An empty string counts as one line.
#[must_use]
pub fn count_lines(text: &str) -> usize {
    let normalized = text.replace("\r\n", "\n");
    normalized.split(['\n', '\r']).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b"), "a &lt; b");
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let raw = r#"<a href="x">Tom & Jerry</a>"#;
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 1);
        assert_eq!(count_lines("one"), 1);
        assert_eq!(count_lines("one\ntwo\r\nthree\rfour"), 4);
        assert_eq!(count_lines("trailing\n"), 2);
    }
}
