//! Generate static post pages

use anyhow::Result;
use std::sync::Arc;

use crate::cms::ContentClient;
use crate::generator::Generator;
use crate::Blog;

/// Generate every published post
pub async fn run(blog: &Blog, client: Arc<dyn ContentClient>) -> Result<()> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog, client)?;
    let slugs = generator.generate().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts in {:.2}s",
        slugs.len(),
        duration.as_secs_f64()
    );

    Ok(())
}
