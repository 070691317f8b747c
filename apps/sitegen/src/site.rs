use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use client_core::{posts, CatalogSource};
use tracing::info;

use crate::page::render_post;

pub fn page_path(out_dir: &Path, slug: &str) -> PathBuf {
    out_dir.join("blog").join(slug).join("index.html")
}

/// Writes one page per static param. The first failure aborts the build.
pub async fn build_site(source: &dyn CatalogSource, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let params = posts::static_params(source).await?;
    let mut written = Vec::with_capacity(params.len());

    for param in params {
        let post = posts::load_post(source, &param.slug).await?;
        let path = page_path(out_dir, &param.slug);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        tokio::fs::write(&path, render_post(&post))
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        info!(slug = %param.slug, path = %path.display(), "wrote post page");
        written.push(path);
    }

    Ok(written)
}
