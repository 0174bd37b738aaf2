use std::collections::HashSet;

use mirror_core::RawItem;
use mirror_logging::{mirror_debug, mirror_info};

use crate::discovery::DiscoveryError;
use crate::source::{Collection, ContentSource};

/// Upper bound on pages walked per collection.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Walks every page of a collection into one flat list.
#[derive(Debug, Clone, Copy)]
pub struct PageCollector {
    max_pages: usize,
}

impl Default for PageCollector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl PageCollector {
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    /// Items come back in API order across pages. Any page failure, a repeated
    /// cursor, or more than `max_pages` pages aborts the whole collection.
    pub async fn collect(
        &self,
        source: &dyn ContentSource,
        collection: Collection,
    ) -> Result<Vec<RawItem>, DiscoveryError> {
        let mut cursor = Some(source.first_page(collection)?);
        let mut visited = HashSet::new();
        let mut items = Vec::new();
        let mut page = 0;

        while let Some(url) = cursor.take() {
            if !visited.insert(url.clone()) {
                return Err(DiscoveryError::PaginationCycle {
                    collection: collection.to_string(),
                    url: url.to_string(),
                });
            }
            page += 1;
            if page > self.max_pages {
                return Err(DiscoveryError::PaginationLimit {
                    collection: collection.to_string(),
                    max_pages: self.max_pages,
                });
            }

            let fetched = source
                .fetch_page(&url)
                .await
                .map_err(|source| DiscoveryError::Pagination {
                    collection: collection.to_string(),
                    page,
                    source: Box::new(source),
                })?;
            mirror_debug!(
                "{} page {}/{}: {} items",
                collection,
                page,
                fetched
                    .total_pages
                    .map_or_else(|| "?".to_string(), |n| n.to_string()),
                fetched.items.len()
            );
            items.extend(fetched.items);
            cursor = fetched.next;
        }

        mirror_info!("Collected {} {} over {} pages", items.len(), collection, page);
        Ok(items)
    }
}
