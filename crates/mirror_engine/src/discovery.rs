use mirror_logging::{mirror_debug, mirror_info};
use reqwest::header::LINK;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::link_header::find_link;

/// Link relation a WordPress-style site uses to advertise its REST root.
pub const API_LINK_REL: &str = "https://api.w.org/";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with http status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("no content API link advertised by {0}")]
    NoApiLink(String),
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to fetch page {page} of {collection}: {source}")]
    Pagination {
        collection: String,
        page: usize,
        #[source]
        source: Box<DiscoveryError>,
    },
    #[error("pagination of {collection} revisited {url}")]
    PaginationCycle { collection: String, url: String },
    #[error("pagination of {collection} exceeded {max_pages} pages")]
    PaginationLimit { collection: String, max_pages: usize },
}

/// Site metadata read from the API root document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SiteInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

/// Result of API discovery, handed to every later stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub api_root: Url,
    pub site: SiteInfo,
}

/// Finds the API root advertised by `site_url` and reads the site metadata.
pub async fn discover(
    client: &reqwest::Client,
    site_url: &Url,
) -> Result<Discovery, DiscoveryError> {
    let response = client
        .head(site_url.clone())
        .send()
        .await
        .map_err(|source| DiscoveryError::Request {
            url: site_url.to_string(),
            source,
        })?;

    let api_root = response
        .headers()
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| find_link(value, API_LINK_REL))
        .ok_or_else(|| DiscoveryError::NoApiLink(site_url.to_string()))?;
    mirror_debug!("Discovered API root {} from {}", api_root, site_url);

    let api_root = Url::parse(&api_root).map_err(|source| DiscoveryError::InvalidUrl {
        url: api_root.clone(),
        source,
    })?;
    discover_from_root(client, api_root).await
}

/// Reads site metadata from a known API root, skipping the `Link` lookup.
pub async fn discover_from_root(
    client: &reqwest::Client,
    api_root: Url,
) -> Result<Discovery, DiscoveryError> {
    let api_root = with_trailing_slash(api_root);
    let url = api_root.to_string();

    let response = client
        .get(api_root.clone())
        .send()
        .await
        .map_err(|source| DiscoveryError::Request {
            url: url.clone(),
            source,
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::HttpStatus {
            url,
            status: status.as_u16(),
        });
    }
    let body = response
        .bytes()
        .await
        .map_err(|source| DiscoveryError::Request {
            url: url.clone(),
            source,
        })?;
    let site: SiteInfo =
        serde_json::from_slice(&body).map_err(|source| DiscoveryError::Decode { url, source })?;

    mirror_info!("Content API at {} serves site {:?}", api_root, site.name);
    Ok(Discovery { api_root, site })
}

// `Url::join` treats the last segment as a file unless it ends in `/`.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
