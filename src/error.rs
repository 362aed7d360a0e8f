//! Error types for the post pipeline

use thiserror::Error;

/// Errors raised while fetching, shaping or rendering a post
#[derive(Debug, Error)]
pub enum Error {
    /// The requested slug (or document id) has no matching document
    #[error("no document found for `{0}`")]
    NotFound(String),

    /// Upstream content is missing fields the page relies on
    #[error("malformed content: {0}")]
    MalformedContent(String),

    /// The content store could not be reached or answered with garbage
    #[error("content store request failed: {context}")]
    TransientFetch {
        context: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedContent(msg.into())
    }

    pub fn transient(context: impl Into<String>, source: reqwest::Error) -> Self {
        Error::TransientFetch {
            context: context.into(),
            source: Some(source),
        }
    }

    /// Whether this error means "no such page" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
