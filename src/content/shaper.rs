//! Shapes raw content-store documents into posts

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::{ContentBlock, PrevNextReference, Post, RichText};
use crate::cms::RawDocument;
use crate::error::{Error, Result};
use crate::helpers::parse_timestamp;

/// Map a raw document to a [`Post`]
///
/// The slug, `data.title` and the `data.content` array must exist. Banner,
/// author and subtitle default to empty. Blocks keep whatever heading/body
/// they carry; the reading-time estimator decides whether that is enough.
pub fn shape_post(raw: &RawDocument) -> Result<Post> {
    let slug = raw
        .uid
        .clone()
        .ok_or_else(|| Error::malformed(format!("document {} has no uid", raw.id)))?;

    let data = raw
        .data
        .as_object()
        .ok_or_else(|| Error::malformed(format!("document {} has no data", slug)))?;

    let title = data
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::malformed(format!("post {} has no title", slug)))?
        .to_string();

    let content = data
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::malformed(format!("post {} has no content", slug)))?
        .iter()
        .map(shape_block)
        .collect::<Result<Vec<_>>>()?;

    let banner_url = data
        .get("banner")
        .and_then(|b| b.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let author = data
        .get("author")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let subtitle = data
        .get("subtitle")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Post {
        first_publication_date: timestamp(raw.first_publication_date.as_deref(), &slug)?,
        last_publication_date: timestamp(raw.last_publication_date.as_deref(), &slug)?,
        slug,
        title,
        subtitle,
        banner_url,
        author,
        content,
    })
}

/// Slug and title of a neighbouring document
pub fn shape_reference(raw: &RawDocument) -> Option<PrevNextReference> {
    let slug = raw.uid.clone()?;
    let title = raw
        .data
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(PrevNextReference { slug, title })
}

fn shape_block(value: &Value) -> Result<ContentBlock> {
    let heading = value
        .get("heading")
        .and_then(Value::as_str)
        .map(str::to_string);

    let body = match value.get("body") {
        Some(body @ Value::Array(_)) => Some(
            serde_json::from_value::<RichText>(body.clone())
                .map_err(|e| Error::malformed(format!("invalid rich text: {}", e)))?,
        ),
        _ => None,
    };

    Ok(ContentBlock { heading, body })
}

fn timestamp(value: Option<&str>, slug: &str) -> Result<Option<DateTime<FixedOffset>>> {
    match value {
        None => Ok(None),
        Some(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| Error::malformed(format!("post {} has invalid date {:?}", slug, s))),
    }
}
