//! Site configuration (_config.yml)

use anyhow::Result;
use chrono::Locale;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming the utterances comment repository
pub const ENV_COMMENTS_REPO: &str = "UTTERANCES_REPO";
/// Environment variable overriding the Prismic API endpoint
pub const ENV_PRISMIC_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding the Prismic access token
pub const ENV_PRISMIC_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub url: String,
    pub root: String,
    pub language: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,
    pub post_dir: String,

    #[serde(default)]
    pub prismic: PrismicConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
    #[serde(default)]
    pub labels: Labels,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling.".to_string(),
            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            public_dir: "public".to_string(),
            post_dir: "post".to_string(),

            prismic: PrismicConfig::default(),
            comments: CommentsConfig::default(),
            labels: Labels::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides using a custom variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(repo) = lookup(ENV_COMMENTS_REPO).filter(|v| !v.is_empty()) {
            self.comments.repo = Some(repo);
        }
        if let Some(endpoint) = lookup(ENV_PRISMIC_ENDPOINT).filter(|v| !v.is_empty()) {
            self.prismic.endpoint = endpoint;
        }
        if let Some(token) = lookup(ENV_PRISMIC_TOKEN).filter(|v| !v.is_empty()) {
            self.prismic.access_token = Some(token);
        }
    }

    /// Locale used for month names. Falls back to POSIX for unknown tags.
    pub fn locale(&self) -> Locale {
        let tag = self.language.replace('-', "_");
        Locale::try_from(tag.as_str()).unwrap_or_else(|_| {
            tracing::warn!("Unknown language {:?}, using POSIX month names", self.language);
            Locale::POSIX
        })
    }

    /// Time zone used to display dates. Falls back to UTC.
    pub fn tz(&self) -> Tz {
        if self.timezone.is_empty() {
            return Tz::UTC;
        }
        self.timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
            Tz::UTC
        })
    }
}

/// Prismic repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismicConfig {
    /// API v2 endpoint, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding blog posts
    pub document_type: String,
    /// Page size used when listing every post
    pub page_size: usize,
    /// HTTP request timeout in seconds
    pub timeout: u64,
}

impl Default for PrismicConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 100,
            timeout: 10,
        }
    }
}

/// utterances comment widget settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// GitHub repository (`owner/name`) backing the comments
    pub repo: Option<String>,
    pub script_src: String,
    pub issue_term: String,
    pub theme: String,
    /// Id of the element the widget attaches to
    pub container_id: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: None,
            script_src: "https://utteranc.es/client.js".to_string(),
            issue_term: "pathname".to_string(),
            theme: "photon-dark".to_string(),
            container_id: "comments".to_string(),
        }
    }
}

/// User-visible strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub loading: String,
    pub not_found: String,
    pub previous_post: String,
    pub next_post: String,
    pub exit_preview: String,
    pub edited_prefix: String,
    pub at: String,
    pub minutes: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            loading: "Carregando...".to_string(),
            not_found: "Post não encontrado".to_string(),
            previous_post: "Post anterior".to_string(),
            next_post: "Próximo post".to_string(),
            exit_preview: "Sair do modo preview".to_string(),
            edited_prefix: "*editado em".to_string(),
            at: "às".to_string(),
            minutes: "min".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.comments.theme, "photon-dark");
        assert_eq!(config.comments.container_id, "comments");
        assert!(config.comments.repo.is_none());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
language: en-US
prismic:
  endpoint: https://blog.cdn.prismic.io/api/v2
comments:
  repo: someone/blog-comments
labels:
  loading: Loading...
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.prismic.endpoint, "https://blog.cdn.prismic.io/api/v2");
        assert_eq!(config.prismic.document_type, "posts");
        assert_eq!(config.comments.repo.as_deref(), Some("someone/blog-comments"));
        assert_eq!(config.comments.issue_term, "pathname");
        assert_eq!(config.labels.loading, "Loading...");
        assert_eq!(config.labels.next_post, "Próximo post");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.apply_env_with(|key| match key {
            ENV_COMMENTS_REPO => Some("owner/repo".to_string()),
            ENV_PRISMIC_TOKEN => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.comments.repo.as_deref(), Some("owner/repo"));
        assert!(config.prismic.access_token.is_none());
        assert!(config.prismic.endpoint.is_empty());
    }

    #[test]
    fn test_locale_and_tz() {
        let mut config = SiteConfig::default();
        assert_eq!(config.locale(), Locale::pt_BR);
        assert_eq!(config.tz(), chrono_tz::America::Sao_Paulo);

        config.language = "xx-YY".to_string();
        config.timezone = "Not/AZone".to_string();
        assert_eq!(config.locale(), Locale::POSIX);
        assert_eq!(config.tz(), Tz::UTC);
    }
}
