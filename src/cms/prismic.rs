//! Prismic REST API v2 client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use super::{ContentClient, Direction, RawDocument};
use crate::config::PrismicConfig;
use crate::error::{Error, Result};

/// Entry point of the API; lists the refs (content versions)
#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    total_pages: usize,
    results: Vec<RawDocument>,
}

/// Query of the `documents/search` endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub predicates: Vec<String>,
    pub orderings: Option<&'static str>,
    pub after: Option<String>,
    pub page_size: usize,
    pub page: usize,
}

impl SearchParams {
    pub fn new(predicates: Vec<String>) -> Self {
        Self {
            predicates,
            orderings: None,
            after: None,
            page_size: 20,
            page: 1,
        }
    }

    /// Query string pairs, with the content version and token
    pub fn query_pairs(&self, reference: &str, access_token: Option<&str>) -> Vec<(String, String)> {
        let mut pairs = vec![("ref".to_string(), reference.to_string())];
        for predicate in &self.predicates {
            pairs.push(("q".to_string(), format!("[{}]", predicate)));
        }
        if let Some(orderings) = self.orderings {
            pairs.push(("orderings".to_string(), orderings.to_string()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after".to_string(), after.clone()));
        }
        pairs.push(("pageSize".to_string(), self.page_size.to_string()));
        pairs.push(("page".to_string(), self.page.to_string()));
        if let Some(token) = access_token {
            pairs.push(("access_token".to_string(), token.to_string()));
        }
        pairs
    }
}

/// `[at(path, "value")]` predicate
fn at(path: &str, value: &str) -> String {
    format!(
        r#"[at({}, "{}")]"#,
        path,
        value.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Live client for a Prismic repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
    doc_type: String,
    page_size: usize,
}

impl PrismicClient {
    pub fn new(config: &PrismicConfig) -> anyhow::Result<Self> {
        if config.endpoint.is_empty() {
            anyhow::bail!("prismic.endpoint is not configured");
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            doc_type: config.document_type.clone(),
            page_size: config.page_size.max(1),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
        what: &str,
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::transient(format!("request for {}", what), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(what.to_string()));
        }

        response
            .error_for_status()
            .map_err(|e| Error::transient(format!("response for {}", what), e))?
            .json::<T>()
            .await
            .map_err(|e| Error::transient(format!("decoding {}", what), e))
    }

    /// The ref to read: the preview ref when given, else the master ref
    async fn resolve_ref(&self, preview_ref: Option<&str>) -> Result<String> {
        if let Some(reference) = preview_ref {
            return Ok(reference.to_string());
        }

        let mut query = Vec::new();
        if let Some(token) = &self.access_token {
            query.push(("access_token".to_string(), token.clone()));
        }
        let info: ApiInfo = self.get_json(&self.endpoint, &query, "api refs").await?;
        info.refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or_else(|| Error::malformed("API entry point lists no master ref"))
    }

    async fn search(
        &self,
        params: &SearchParams,
        preview_ref: Option<&str>,
        what: &str,
    ) -> Result<SearchResponse> {
        let reference = self.resolve_ref(preview_ref).await?;
        let url = format!("{}/documents/search", self.endpoint);
        let query = params.query_pairs(&reference, self.access_token.as_deref());
        tracing::debug!("Prismic search for {}: {:?}", what, params.predicates);
        self.get_json(&url, &query, what).await
    }

    fn type_predicate(&self) -> String {
        at("document.type", &self.doc_type)
    }
}

#[async_trait]
impl ContentClient for PrismicClient {
    async fn fetch_by_slug(&self, slug: &str, preview_ref: Option<&str>) -> Result<RawDocument> {
        let mut params = SearchParams::new(vec![
            self.type_predicate(),
            at(&format!("my.{}.uid", self.doc_type), slug),
        ]);
        params.page_size = 1;

        self.search(&params, preview_ref, slug)
            .await?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(slug.to_string()))
    }

    async fn fetch_by_id(&self, id: &str, preview_ref: Option<&str>) -> Result<RawDocument> {
        let mut params = SearchParams::new(vec![at("document.id", id)]);
        params.page_size = 1;

        self.search(&params, preview_ref, id)
            .await?
            .results
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn query_adjacent(
        &self,
        direction: Direction,
        after_id: &str,
        preview_ref: Option<&str>,
    ) -> Result<Option<RawDocument>> {
        let mut params = SearchParams::new(vec![self.type_predicate()]);
        params.orderings = Some(direction.orderings());
        params.after = Some(after_id.to_string());
        params.page_size = 1;

        let what = format!("post adjacent to {}", after_id);
        Ok(self
            .search(&params, preview_ref, &what)
            .await?
            .results
            .into_iter()
            .next())
    }

    async fn list_all(&self, preview_ref: Option<&str>) -> Result<Vec<RawDocument>> {
        let mut params = SearchParams::new(vec![self.type_predicate()]);
        params.orderings = Some(Direction::Descending.orderings());
        params.page_size = self.page_size;

        let mut documents = Vec::new();
        loop {
            let what = format!("post list page {}", params.page);
            let response = self.search(&params, preview_ref, &what).await?;
            documents.extend(response.results);
            if response.page >= response.total_pages {
                break;
            }
            params.page = response.page + 1;
        }
        Ok(documents)
    }
}
