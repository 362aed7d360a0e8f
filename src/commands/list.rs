//! List the posts held by the content store

use anyhow::Result;
use std::io::Write;

use crate::cms::ContentClient;
use crate::content::shape_post;
use crate::helpers::post_url;
use crate::Blog;

/// Print every post, newest first
pub async fn run(blog: &Blog, client: &dyn ContentClient) -> Result<()> {
    let mut out = Vec::new();
    write_listing(blog, client, &mut out).await?;
    std::io::stdout().write_all(&out)?;
    Ok(())
}

async fn write_listing<W: Write>(
    blog: &Blog,
    client: &dyn ContentClient,
    out: &mut W,
) -> Result<()> {
    let documents = client.list_all(None).await?;
    writeln!(out, "Posts ({}):", documents.len())?;

    for document in documents {
        match shape_post(&document) {
            Ok(post) => {
                let date = post
                    .first_publication_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "----------".to_string());
                writeln!(
                    out,
                    "  {} - {} [{}]",
                    date,
                    post.title,
                    post_url(&blog.config, &post.slug)
                )?;
            }
            Err(e) => {
                tracing::warn!("Skipping document {}: {}", document.id, e);
            }
        }
    }

    Ok(())
}
