//! Generator module - writes post pages into the public directory

use anyhow::{Context as _, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cms::ContentClient;
use crate::page::PostPageRenderer;
use crate::Blog;

/// Static site generator for post pages
pub struct Generator {
    public_dir: PathBuf,
    post_dir: String,
    renderer: Arc<PostPageRenderer>,
}

/// Whether `slug` can be used as a single directory name
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug != "."
        && slug != ".."
        && !slug.contains(['/', '\\'])
        && !slug.chars().any(char::is_control)
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, client: Arc<dyn ContentClient>) -> Result<Self> {
        let renderer = PostPageRenderer::new(blog.config.clone(), client)?;
        Ok(Self::with_renderer(blog, Arc::new(renderer)))
    }

    pub fn with_renderer(blog: &Blog, renderer: Arc<PostPageRenderer>) -> Self {
        Self {
            public_dir: blog.public_dir.clone(),
            post_dir: blog.config.post_dir.clone(),
            renderer,
        }
    }

    pub fn renderer(&self) -> &Arc<PostPageRenderer> {
        &self.renderer
    }

    /// Where the page for `slug` is written
    pub fn output_path(&self, slug: &str) -> PathBuf {
        self.public_dir
            .join(&self.post_dir)
            .join(slug)
            .join("index.html")
    }

    /// Generate every published post plus the not-found page
    ///
    /// Returns the slugs that were written.
    pub async fn generate(&self) -> Result<Vec<String>> {
        fs::create_dir_all(&self.public_dir)?;

        let documents = self
            .renderer
            .client()
            .list_all(None)
            .await
            .context("Failed to list posts")?;
        tracing::info!("Found {} posts", documents.len());

        let mut generated = Vec::new();
        for document in documents {
            let Some(slug) = document.uid.filter(|s| is_safe_slug(s)) else {
                tracing::warn!("Skipping document {} without a usable uid", document.id);
                continue;
            };
            self.generate_post(&slug)
                .await
                .with_context(|| format!("Failed to generate post {}", slug))?;
            generated.push(slug);
        }

        self.generate_not_found()?;

        Ok(generated)
    }

    /// Render and write the published page for one slug
    pub async fn generate_post(&self, slug: &str) -> crate::Result<PathBuf> {
        let html = self.renderer.render_slug(slug, None).await?;
        self.write_post(slug, &html)
    }

    /// Store a rendered published page under its slug
    ///
    /// The page is written to a temporary file next to its final path and
    /// renamed into place, so readers see either the old page or the new one.
    pub fn write_post(&self, slug: &str, html: &str) -> crate::Result<PathBuf> {
        let output_path = self.output_path(slug);
        let dir = output_path.parent().unwrap_or(&self.public_dir);
        fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(html.as_bytes())?;
        file.persist(&output_path).map_err(|e| e.error)?;
        tracing::debug!("Generated post: {:?}", output_path);

        Ok(output_path)
    }

    /// Write `404.html` at the root of the public directory
    pub fn generate_not_found(&self) -> Result<()> {
        let html = self.renderer.render_not_found()?;
        let output_path = self.public_dir.join("404.html");
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{FixtureClient, RawDocument};
    use crate::config::SiteConfig;
    use serde_json::json;

    fn blog(dir: &std::path::Path) -> Blog {
        Blog::with_config(dir, SiteConfig::default())
    }

    fn document(id: &str, uid: &str, date: &str) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: Some(date.to_string()),
            last_publication_date: Some(date.to_string()),
            data: json!({
                "title": uid,
                "author": "Autor",
                "content": [{ "heading": "Intro", "body": [
                    { "type": "paragraph", "text": "Algumas palavras aqui.", "spans": [] }
                ]}]
            }),
        }
    }

    #[test]
    fn test_is_safe_slug() {
        assert!(is_safe_slug("como-utilizar-hooks"));
        assert!(!is_safe_slug(""));
        assert!(!is_safe_slug(".."));
        assert!(!is_safe_slug("a/b"));
        assert!(!is_safe_slug("a\\b"));
    }

    #[tokio::test]
    async fn test_generate_writes_every_post() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        let client = FixtureClient::new(
            vec![
                document("A", "primeiro", "2021-01-01T00:00:00+0000"),
                document("B", "segundo", "2021-02-01T00:00:00+0000"),
                document("C", "../escape", "2021-03-01T00:00:00+0000"),
            ],
            "posts",
        );
        let generator = Generator::new(&blog, Arc::new(client)).unwrap();

        let slugs = generator.generate().await.unwrap();
        assert_eq!(slugs, vec!["segundo", "primeiro"]);

        let first = fs::read_to_string(blog.public_dir.join("post/primeiro/index.html")).unwrap();
        assert!(first.contains("<h1>primeiro</h1>"));
        assert!(first.contains(r#"<a href="/post/segundo">Próximo post</a>"#));
        assert!(blog.public_dir.join("post/segundo/index.html").exists());
        assert!(blog.public_dir.join("404.html").exists());
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn test_write_post_replaces_page_in_one_step() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        let client = Arc::new(FixtureClient::new(vec![], "posts"));
        let generator = Generator::new(&blog, client).unwrap();

        generator.write_post("primeiro", "<p>v1</p>").unwrap();
        let path = generator.write_post("primeiro", "<p>v2</p>").unwrap();

        assert_eq!(path, blog.public_dir.join("post/primeiro/index.html"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>v2</p>");
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["index.html"]);
    }

    #[tokio::test]
    async fn test_malformed_post_fails_the_build() {
        let dir = tempfile::tempdir().unwrap();
        let blog = blog(dir.path());
        let mut broken = document("A", "quebrado", "2021-01-01T00:00:00+0000");
        broken.data = json!({ "title": "Quebrado", "content": [{ "heading": "Sem corpo" }] });
        let generator =
            Generator::new(&blog, Arc::new(FixtureClient::new(vec![broken], "posts"))).unwrap();

        let err = generator.generate().await.unwrap_err();
        assert!(format!("{:#}", err).contains("quebrado"));
    }
}
