use std::fmt;

use mirror_core::RawItem;
use mirror_logging::mirror_debug;
use reqwest::header::{HeaderMap, LINK};
use url::Url;

use crate::discovery::DiscoveryError;
use crate::link_header::find_link;

/// Page size requested from the content API. The API caps this at 100.
pub const DEFAULT_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Posts,
    Pages,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Pages => "pages",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of a collection plus the cursor for the following page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionPage {
    pub items: Vec<RawItem>,
    pub next: Option<Url>,
    pub total_pages: Option<usize>,
}

/// Paginated, read-only access to content collections with related data embedded.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    fn first_page(&self, collection: Collection) -> Result<Url, DiscoveryError>;

    async fn fetch_page(&self, cursor: &Url) -> Result<CollectionPage, DiscoveryError>;
}

/// WordPress REST v2 collections under a discovered API root.
#[derive(Debug, Clone)]
pub struct WpContentSource {
    client: reqwest::Client,
    api_root: Url,
    per_page: usize,
}

impl WpContentSource {
    pub fn new(client: reqwest::Client, api_root: Url, per_page: usize) -> Self {
        Self {
            client,
            api_root: crate::discovery::with_trailing_slash(api_root),
            per_page: per_page.max(1),
        }
    }
}

#[async_trait::async_trait]
impl ContentSource for WpContentSource {
    fn first_page(&self, collection: Collection) -> Result<Url, DiscoveryError> {
        let path = format!("wp/v2/{collection}");
        let mut url = self
            .api_root
            .join(&path)
            .map_err(|source| DiscoveryError::InvalidUrl { url: path, source })?;
        url.query_pairs_mut()
            .append_pair("_embed", "1")
            .append_pair("per_page", &self.per_page.to_string());
        Ok(url)
    }

    async fn fetch_page(&self, cursor: &Url) -> Result<CollectionPage, DiscoveryError> {
        let url = ensure_embed(cursor.clone());
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| DiscoveryError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|source| DiscoveryError::Request {
                url: url.to_string(),
                source,
            })?;
        let items: Vec<RawItem> =
            serde_json::from_slice(&body).map_err(|source| DiscoveryError::Decode {
                url: url.to_string(),
                source,
            })?;

        let total_pages = header_number(&headers, "x-wp-totalpages");
        mirror_debug!(
            "Fetched {} items from {} (total={:?}, pages={:?})",
            items.len(),
            url,
            header_number(&headers, "x-wp-total"),
            total_pages
        );

        Ok(CollectionPage {
            items,
            next: next_link(&headers, &url)?,
            total_pages,
        })
    }
}

fn next_link(headers: &HeaderMap, base: &Url) -> Result<Option<Url>, DiscoveryError> {
    let next = headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| find_link(value, "next"));
    match next {
        // Relative targets resolve against the page that carried them.
        Some(link) => base
            .join(&link)
            .map(Some)
            .map_err(|source| DiscoveryError::InvalidUrl { url: link, source }),
        None => Ok(None),
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<usize> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

fn ensure_embed(mut url: Url) -> Url {
    if !url.query_pairs().any(|(key, _)| key == "_embed") {
        url.query_pairs_mut().append_pair("_embed", "1");
    }
    url
}
