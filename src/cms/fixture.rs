//! Content client backed by a JSON file of raw documents

use async_trait::async_trait;
use std::fs;
use std::path::Path;

use super::{ContentClient, Direction, RawDocument};
use crate::error::{Error, Result};
use crate::helpers::parse_timestamp;

/// Serves posts from memory, ordered by first publication date
#[derive(Debug, Clone)]
pub struct FixtureClient {
    /// Documents of the post type, oldest first
    documents: Vec<RawDocument>,
}

impl FixtureClient {
    /// Keep the documents of `doc_type` and order them by publication date
    pub fn new(documents: Vec<RawDocument>, doc_type: &str) -> Self {
        let mut documents: Vec<_> = documents
            .into_iter()
            .filter(|d| d.doc_type == doc_type)
            .collect();
        documents.sort_by(|a, b| {
            let date_a = a.first_publication_date.as_deref().and_then(parse_timestamp);
            let date_b = b.first_publication_date.as_deref().and_then(parse_timestamp);
            date_a.cmp(&date_b).then_with(|| a.id.cmp(&b.id))
        });
        Self { documents }
    }

    /// Load a JSON array of documents, or a search response with `results`
    pub fn load<P: AsRef<Path>>(path: P, doc_type: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let documents: Vec<RawDocument> = match value.get("results") {
            Some(results) => serde_json::from_value(results.clone())?,
            None => serde_json::from_value(value)?,
        };
        tracing::debug!(
            "Loaded {} fixture documents from {:?}",
            documents.len(),
            path.as_ref()
        );
        Ok(Self::new(documents, doc_type))
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

#[async_trait]
impl ContentClient for FixtureClient {
    async fn fetch_by_slug(&self, slug: &str, _preview_ref: Option<&str>) -> Result<RawDocument> {
        self.documents
            .iter()
            .find(|d| d.uid.as_deref() == Some(slug))
            .cloned()
            .ok_or_else(|| Error::NotFound(slug.to_string()))
    }

    async fn fetch_by_id(&self, id: &str, _preview_ref: Option<&str>) -> Result<RawDocument> {
        let pos = self.position(id)?;
        Ok(self.documents[pos].clone())
    }

    async fn query_adjacent(
        &self,
        direction: Direction,
        after_id: &str,
        _preview_ref: Option<&str>,
    ) -> Result<Option<RawDocument>> {
        let pos = self.position(after_id)?;
        let adjacent = match direction {
            Direction::Ascending => self.documents.get(pos + 1),
            Direction::Descending => pos.checked_sub(1).and_then(|p| self.documents.get(p)),
        };
        Ok(adjacent.cloned())
    }

    async fn list_all(&self, _preview_ref: Option<&str>) -> Result<Vec<RawDocument>> {
        Ok(self.documents.iter().rev().cloned().collect())
    }
}
