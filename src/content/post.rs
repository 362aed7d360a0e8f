//! Post and page view models

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::RichText;

/// A blog post, shaped from a content-store document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Unique, URL-friendly identifier assigned by the content store
    pub slug: String,

    /// First publication date
    pub first_publication_date: Option<DateTime<FixedOffset>>,

    /// Date of the most recent published edit
    pub last_publication_date: Option<DateTime<FixedOffset>>,

    pub title: String,

    /// Used as the page description
    pub subtitle: Option<String>,

    /// Banner image URL (empty when missing)
    pub banner_url: String,

    /// Author name (empty when missing)
    pub author: String,

    /// Content blocks, in source order
    pub content: Vec<ContentBlock>,
}

/// A titled section of a post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    pub heading: Option<String>,
    pub body: Option<RichText>,
}

impl ContentBlock {
    /// Stable identity for the block at `index`, derived from position and content
    pub fn key(&self, index: usize) -> String {
        let mut hasher = DefaultHasher::new();
        self.heading.hash(&mut hasher);
        if let Some(body) = &self.body {
            body.as_text().hash(&mut hasher);
        }
        format!("{}-{:016x}", index, hasher.finish())
    }
}

/// Slug and title of a neighbouring post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrevNextReference {
    pub slug: String,
    pub title: String,
}

/// Everything the post page needs, built fresh for each render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageViewModel {
    pub post: Post,
    pub last_edit_time: Option<DateTime<FixedOffset>>,
    pub preview: bool,
    /// The nearest older post
    pub prev_post: Option<PrevNextReference>,
    /// The nearest newer post
    pub next_post: Option<PrevNextReference>,
}

impl PageViewModel {
    /// The edit time, only when it differs from the first publication
    pub fn edited_at(&self) -> Option<DateTime<FixedOffset>> {
        self.last_edit_time
            .filter(|edit| Some(*edit) != self.post.first_publication_date)
    }
}
