//! spacetraveling: blog post pages backed by the Prismic headless CMS
//!
//! Posts are fetched from Prismic (or a local JSON fixture), shaped into a
//! page view model and rendered with embedded Tera templates. Each page
//! carries an utterances comment section.

pub mod cms;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod page;
pub mod server;
pub mod templates;

pub use error::{Error, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentClient, FixtureClient, PrismicClient};

/// The main blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Create a new blog from a directory
    ///
    /// Reads `_config.yml` when present, then applies environment overrides.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> anyhow::Result<Self> {
        let config_path = base_dir.as_ref().join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a blog with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);
        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Content client for this blog
    ///
    /// With `fixtures` the posts come from that JSON file, otherwise from the
    /// configured Prismic repository.
    pub fn client(&self, fixtures: Option<&Path>) -> anyhow::Result<Arc<dyn ContentClient>> {
        let doc_type = &self.config.prismic.document_type;
        match fixtures {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    self.base_dir.join(path)
                };
                tracing::info!("Reading posts from {:?}", path);
                Ok(Arc::new(FixtureClient::load(path, doc_type)?))
            }
            None => {
                tracing::info!("Reading posts from {}", self.config.prismic.endpoint);
                Ok(Arc::new(PrismicClient::new(&self.config.prismic)?))
            }
        }
    }

    /// Generate every post page
    pub async fn generate(&self, client: Arc<dyn ContentClient>) -> anyhow::Result<()> {
        commands::generate::run(self, client).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_new_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "spacetraveling.");
        assert_eq!(blog.public_dir, dir.path().join("public"));
    }

    #[test]
    fn test_new_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Meu blog\npublic_dir: site\ncomments:\n  theme: github-light\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Meu blog");
        assert_eq!(blog.config.comments.theme, "github-light");
        assert_eq!(blog.public_dir, dir.path().join("site"));
    }

    #[test]
    fn test_fixture_client_path_is_relative_to_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("posts.json"), "[]").unwrap();
        let blog = Blog::with_config(dir.path(), config::SiteConfig::default());
        assert!(blog.client(Some(Path::new("posts.json"))).is_ok());
        assert!(blog.client(Some(Path::new("missing.json"))).is_err());
    }

    #[test]
    fn test_prismic_client_needs_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::with_config(dir.path(), config::SiteConfig::default());
        assert!(blog.client(None).is_err());
    }
}
