//! Built-in spacetraveling templates using the Tera template engine
//!
//! All templates are embedded directly in the binary.

use serde::Serialize;
use tera::{Context, Tera};

use crate::config::Labels;
use crate::error::Result;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Page data is escaped when it is built; block HTML must pass through
        // untouched, so Tera does no escaping of its own.
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context. Every string is HTML-ready.

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub home: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    pub subtitle: Option<String>,
    pub banner_url: String,
    pub author: String,
    pub published: String,
    pub published_iso: Option<String>,
    pub edited: Option<String>,
    pub reading_time: usize,
    pub blocks: Vec<BlockData>,
    pub prev_post: Option<NavPost>,
    pub next_post: Option<NavPost>,
    pub preview: bool,
    pub exit_preview_href: String,
    pub comments_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockData {
    pub key: String,
    pub heading: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub href: String,
}

/// Labels with every value escaped
pub fn escaped_labels(labels: &Labels) -> Labels {
    use crate::helpers::html_escape;
    Labels {
        loading: html_escape(&labels.loading),
        not_found: html_escape(&labels.not_found),
        previous_post: html_escape(&labels.previous_post),
        next_post: html_escape(&labels.next_post),
        exit_preview: html_escape(&labels.exit_preview),
        edited_prefix: html_escape(&labels.edited_prefix),
        at: html_escape(&labels.at),
        minutes: html_escape(&labels.minutes),
    }
}
