//! Site-relative path arithmetic.
//!
//! All paths handled here are output paths using `/` separators, e.g.
//! `fuse/elements/element.html`. Backslashes are normalized first so paths derived
//! from the file system behave the same on every platform.

use std::path::Path;

/// Relative link from the page at `current` to `target`, with `extension` appended.
///
/// One `../` is emitted per directory level of `current`; `target` itself is taken
/// relative to the site root.
///
/// # Examples
///
/// ```rust
/// use docweave::utils::relative_path;
///
/// assert_eq!(relative_path("fuse/node.html", "fuse/visual", Some("html")), "../fuse/visual.html");
/// assert_eq!(relative_path("index.html", "guide", Some("html")), "guide.html");
/// assert_eq!(relative_path("a/b/c.html", "img/x.png", None), "../../img/x.png");
/// ```
#[must_use]
pub fn relative_path(current: &str, target: &str, extension: Option<&str>) -> String {
    let current = normalize_separators(current);
    let depth = current.split('/').count().saturating_sub(1);

    let mut out = "../".repeat(depth);
    out.push_str(&normalize_separators(target));
    if let Some(ext) = extension.filter(|e| !e.trim().is_empty()) {
        out.push('.');
        out.push_str(ext);
    }
    out
}

/// Replace `\` with `/`.
#[must_use]
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// `path` relative to `base` as a `/`-separated string.
///
/// Returns `None` when `path` is not under `base` or is not valid UTF-8.
#[must_use]
pub fn site_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

/// Join a site path onto the directory of `current`, resolving `.` and `..`.
///
/// Returns `None` if the path climbs above the site root.
#[must_use]
pub fn resolve_from(current: &str, link: &str) -> Option<String> {
    let current = normalize_separators(current);
    let mut segments: Vec<&str> = current.split('/').collect();
    segments.pop();

    for part in link.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_relative_path_depth() {
        assert_eq!(relative_path("a.html", "b", Some("html")), "b.html");
        assert_eq!(relative_path("x/y/a.html", "b/c", Some("html")), "../../b/c.html");
        assert_eq!(relative_path("x\\a.html", "b\\c", Some("html")), "../b/c.html");
        assert_eq!(relative_path("x/a.html", "b", Some("")), "../b");
    }

    #[test]
    fn test_site_path() {
        let base = PathBuf::from("/out");
        assert_eq!(
            site_path(&base, &PathBuf::from("/out/fuse/node.html")).as_deref(),
            Some("fuse/node.html")
        );
        assert_eq!(site_path(&base, &PathBuf::from("/elsewhere/x.html")), None);
    }

    #[test]
    fn test_resolve_from() {
        assert_eq!(resolve_from("a/b/page.html", "../c.html").as_deref(), Some("a/c.html"));
        assert_eq!(resolve_from("page.html", "./c.html").as_deref(), Some("c.html"));
        assert_eq!(resolve_from("page.html", "../c.html"), None);
    }
}
