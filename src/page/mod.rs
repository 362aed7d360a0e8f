//! Post page pipeline: fetch, shape, estimate and render

use std::sync::Arc;

use tera::Context;

use crate::cms::{ContentClient, Direction};
use crate::comments::{CommentSection, CommentWidget, Document};
use crate::config::SiteConfig;
use crate::content::{estimate, shape_post, shape_reference, PageViewModel, PrevNextReference};
use crate::error::Result;
use crate::helpers::{date_xml, edit_date, html_escape, post_url, publication_date, url_for};
use crate::templates::{
    escaped_labels, BlockData, NavPost, PostData, SiteData, TemplateRenderer,
};

/// Renders post pages from a content store
pub struct PostPageRenderer {
    config: SiteConfig,
    client: Arc<dyn ContentClient>,
    templates: TemplateRenderer,
    widget: CommentWidget,
}

impl PostPageRenderer {
    pub fn new(config: SiteConfig, client: Arc<dyn ContentClient>) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            widget: CommentWidget::new(config.comments.clone()),
            config,
            client,
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn ContentClient> {
        &self.client
    }

    /// Build the view model for `slug`
    ///
    /// A `preview_ref` switches to preview mode and reads that content
    /// version instead of the published one.
    pub async fn load(&self, slug: &str, preview_ref: Option<&str>) -> Result<PageViewModel> {
        let raw = self.client.fetch_by_slug(slug, preview_ref).await?;
        let post = shape_post(&raw)?;

        // previous = nearest older post, next = nearest newer post
        let (older, newer) = tokio::try_join!(
            self.client
                .query_adjacent(Direction::Descending, &raw.id, preview_ref),
            self.client
                .query_adjacent(Direction::Ascending, &raw.id, preview_ref),
        )?;

        Ok(PageViewModel {
            last_edit_time: post.last_publication_date,
            post,
            preview: preview_ref.is_some(),
            prev_post: older.as_ref().and_then(shape_reference),
            next_post: newer.as_ref().and_then(shape_reference),
        })
    }

    /// Load and render in one go
    pub async fn render_slug(&self, slug: &str, preview_ref: Option<&str>) -> Result<String> {
        let view = self.load(slug, preview_ref).await?;
        self.render(&view)
    }

    /// Render the full post document, comment widget included
    pub fn render(&self, view: &PageViewModel) -> Result<String> {
        let data = self.post_data(view)?;

        let mut context = self.base_context();
        context.insert("post", &data);
        let html = self.templates.render("post.html", &context)?;

        // Looked up the way it was written into the markup
        let document = Document::new(html);
        let mut comments = CommentSection::new(self.widget.clone());
        comments.mount(&document, &data.comments_id);
        Ok(document.to_html())
    }

    pub fn render_loading(&self) -> Result<String> {
        self.templates.render("loading.html", &self.base_context())
    }

    pub fn render_not_found(&self) -> Result<String> {
        self.templates.render("not_found.html", &self.base_context())
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: html_escape(&self.config.title),
                language: html_escape(&self.config.language),
                home: html_escape(&url_for(&self.config, "/")),
            },
        );
        context.insert("labels", &escaped_labels(&self.config.labels));
        context
    }

    fn post_data(&self, view: &PageViewModel) -> Result<PostData> {
        let post = &view.post;
        let reading_time = estimate(&post.content)?;
        let locale = self.config.locale();
        let tz = self.config.tz();
        let labels = &self.config.labels;

        let published = post.first_publication_date.map(|d| d.with_timezone(&tz));
        let edited = view.edited_at().map(|d| {
            edit_date(
                &d.with_timezone(&tz),
                locale,
                &labels.edited_prefix,
                &labels.at,
            )
        });

        let blocks = post
            .content
            .iter()
            .enumerate()
            .map(|(index, block)| BlockData {
                key: block.key(index),
                heading: html_escape(block.heading.as_deref().unwrap_or_default()),
                html: block
                    .body
                    .as_ref()
                    .map(|body| body.as_html())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(PostData {
            title: html_escape(&post.title),
            subtitle: post.subtitle.as_deref().map(html_escape),
            banner_url: html_escape(&post.banner_url),
            author: html_escape(&post.author),
            published: published
                .as_ref()
                .map(|d| html_escape(&publication_date(d, locale)))
                .unwrap_or_default(),
            published_iso: published.as_ref().map(date_xml),
            edited: edited.map(|e| html_escape(&e)),
            reading_time: reading_time.minutes,
            blocks,
            prev_post: view.prev_post.as_ref().map(|r| self.nav_post(r)),
            next_post: view.next_post.as_ref().map(|r| self.nav_post(r)),
            preview: view.preview,
            exit_preview_href: html_escape(&url_for(&self.config, "api/exit-preview")),
            comments_id: html_escape(&self.config.comments.container_id),
        })
    }

    fn nav_post(&self, reference: &PrevNextReference) -> NavPost {
        NavPost {
            title: html_escape(&reference.title),
            href: html_escape(&post_url(&self.config, &reference.slug)),
        }
    }
}
