//! Remote catalog API: request building and the HTTP-backed [`CatalogSource`].

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{PostId, QueryState},
    protocol::{Post, PostPage, ProductPage},
};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

/// Source of posts and products. The listing controller and the static page
/// helpers only talk to the remote through this seam.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn search_products(&self, query: &QueryState) -> ClientResult<ProductPage>;
    async fn list_posts(&self) -> ClientResult<PostPage>;
    async fn fetch_post(&self, id: PostId) -> ClientResult<Post>;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let invalid = |reason: &str| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: reason.to_string(),
        };
        let base = Url::parse(base_url.trim()).map_err(|err| invalid(&err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if base.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path"));
        }
        Ok(Self { base })
    }

    fn path(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `{base}/products/search?q={term}&sortBy={field}&sortOrder={dir}`
    pub fn product_search(&self, query: &QueryState) -> Url {
        let mut url = self.path(&["products", "search"]);
        url.query_pairs_mut()
            .append_pair("q", &query.search_term)
            .append_pair("sortBy", query.sort_by.as_query_value())
            .append_pair("sortOrder", query.sort_order.as_query_value());
        url
    }

    pub fn posts(&self) -> Url {
        self.path(&["posts"])
    }

    pub fn post(&self, id: PostId) -> Url {
        let id = id.to_string();
        self.path(&["posts", id.as_str()])
    }
}

pub struct HttpCatalogClient {
    http: Client,
    endpoints: Endpoints,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_http(Client::new(), base_url)
    }

    pub fn with_http(http: Client, base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http,
            endpoints: Endpoints::new(base_url)?,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogClient {
    async fn search_products(&self, query: &QueryState) -> ClientResult<ProductPage> {
        self.get_json(self.endpoints.product_search(query)).await
    }

    async fn list_posts(&self) -> ClientResult<PostPage> {
        self.get_json(self.endpoints.posts()).await
    }

    async fn fetch_post(&self, id: PostId) -> ClientResult<Post> {
        self.get_json(self.endpoints.post(id)).await
    }
}
