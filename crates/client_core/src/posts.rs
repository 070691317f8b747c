//! Post detail pages: enumerating which pages exist and loading one of them.
//! Errors here are fatal to the page being generated and are never retried.

use anyhow::{Context, Result};
use shared::{
    domain::PostId,
    protocol::{Post, StaticParam},
};
use tracing::info;

use crate::api::CatalogSource;

pub async fn static_params(source: &dyn CatalogSource) -> Result<Vec<StaticParam>> {
    let page = source
        .list_posts()
        .await
        .context("failed to list posts for static params")?;
    let params: Vec<StaticParam> = page.posts.iter().map(StaticParam::from).collect();
    info!(count = params.len(), "enumerated post pages");
    Ok(params)
}

pub async fn load_post(source: &dyn CatalogSource, slug: &str) -> Result<Post> {
    let id: PostId = slug.parse()?;
    source
        .fetch_post(id)
        .await
        .with_context(|| format!("failed to load post {id}"))
}
