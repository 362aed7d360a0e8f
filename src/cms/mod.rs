//! Content store clients
//!
//! The page pipeline only talks to the [`ContentClient`] trait. The live
//! implementation queries the Prismic REST API; the fixture implementation
//! serves the same contract from a JSON file for offline builds and tests.

mod fixture;
mod prismic;

pub use fixture::FixtureClient;
pub use prismic::{PrismicClient, SearchParams};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A document as returned by the content store, before shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// Direction of a publication-date ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Oldest first: the document "after" the current one is newer
    Ascending,
    /// Newest first: the document "after" the current one is older
    Descending,
}

impl Direction {
    /// Prismic `orderings` parameter for this direction
    pub fn orderings(self) -> &'static str {
        match self {
            Direction::Ascending => "[document.first_publication_date]",
            Direction::Descending => "[document.first_publication_date desc]",
        }
    }
}

/// Read access to the posts held by the content store
///
/// `preview_ref` selects a draft version of the content; `None` reads the
/// published (master) version.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Fetch the post whose unique slug is `slug`
    async fn fetch_by_slug(&self, slug: &str, preview_ref: Option<&str>) -> Result<RawDocument>;

    /// Fetch a post by its document id
    async fn fetch_by_id(&self, id: &str, preview_ref: Option<&str>) -> Result<RawDocument>;

    /// The single post that follows `after_id` in the given ordering, if any
    async fn query_adjacent(
        &self,
        direction: Direction,
        after_id: &str,
        preview_ref: Option<&str>,
    ) -> Result<Option<RawDocument>>;

    /// Every post, newest first
    async fn list_all(&self, preview_ref: Option<&str>) -> Result<Vec<RawDocument>>;
}
