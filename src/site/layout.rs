//! Page layout applied to every finished page
//!
//! The layout is a Tera template with four variables:
//!
//! - `body` - the page HTML
//! - `navigation` - the rendered outline
//! - `title` - `<page title> - <site title>`, already HTML escaped
//! - `base_url` - the site base URL
//!
//! The template is registered under a name without extension, so Tera does not
//! autoescape and `body` is inserted verbatim.

use crate::config::BuilderSettings;
use crate::core::DocError;
use crate::utils::escape_html;
use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

const TEMPLATE_NAME: &str = "layout";

/// Parsed layout template.
#[derive(Debug)]
pub struct Layout {
    tera: Tera,
    base_url: String,
    site_title: String,
}

impl Layout {
    /// Load the layout named by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::SourceFileNotFound`] if the template does not exist and
    /// [`DocError::LayoutError`] if it does not parse.
    pub fn load(settings: &BuilderSettings) -> Result<Self> {
        let path = settings.layout_path();
        if !path.is_file() {
            return Err(DocError::SourceFileNotFound {
                what: "layout template".to_string(),
                path: path.display().to_string(),
            }
            .into());
        }

        let template = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read layout {}", path.display()))?;
        Self::from_template(&template, &settings.base_url, settings.site.site_title())
            .with_context(|| format!("Invalid layout template {}", path.display()))
    }

    /// Build a layout from template text.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::LayoutError`] if the template does not parse.
    pub fn from_template(template: &str, base_url: &str, site_title: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template).map_err(|e| DocError::LayoutError {
            reason: describe(&e),
        })?;

        Ok(Self {
            tera,
            base_url: base_url.to_string(),
            site_title: site_title.to_string(),
        })
    }

    /// Wrap `body` in the layout.
    ///
    /// An empty `title` leaves just the site title.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::LayoutError`] if rendering fails, e.g. on an unknown variable.
    pub fn apply(&self, body: &str, navigation: &str, title: &str) -> Result<String> {
        let full_title = if title.is_empty() {
            self.site_title.clone()
        } else {
            format!("{title} - {}", self.site_title)
        };

        let mut context = TeraContext::new();
        context.insert("body", body);
        context.insert("navigation", navigation);
        context.insert("title", &escape_html(&full_title));
        context.insert("base_url", &self.base_url);

        let html = self.tera.render(TEMPLATE_NAME, &context).map_err(|e| DocError::LayoutError {
            reason: describe(&e),
        })?;
        Ok(html)
    }
}

/// Join the Tera error chain into one line.
fn describe(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = vec![error.to_string()];
    let mut source = error.source();
    while let Some(inner) = source {
        messages.push(inner.to_string());
        source = inner.source();
    }
    messages.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str =
        "<title>{{ title }}</title><base href=\"{{ base_url }}\"><nav>{{ navigation }}</nav><main>{{ body }}</main>";

    #[test]
    fn test_apply() {
        let layout = Layout::from_template(TEMPLATE, "/docs/", "Docs").unwrap();
        let html = layout.apply("<h1>Intro</h1>", "<ul></ul>", "Intro & <more>").unwrap();

        assert_eq!(
            html,
            "<title>Intro &amp; &lt;more&gt; - Docs</title><base href=\"/docs/\"><nav><ul></ul></nav><main><h1>Intro</h1></main>"
        );
    }

    #[test]
    fn test_empty_title_uses_site_title() {
        let layout = Layout::from_template("{{ title }}", "/", "Docs").unwrap();
        assert_eq!(layout.apply("", "", "").unwrap(), "Docs");
    }

    #[test]
    fn test_invalid_template() {
        let err = Layout::from_template("{% if %}", "/", "Docs").unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::LayoutError { .. })));
    }

    #[test]
    fn test_unknown_variable_fails_at_render() {
        let layout = Layout::from_template("{{ footer }}", "/", "Docs").unwrap();
        let err = layout.apply("", "", "").unwrap_err();
        assert!(matches!(err.downcast_ref::<DocError>(), Some(DocError::LayoutError { .. })));
    }
}
