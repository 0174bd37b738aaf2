use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use mirror_core::RawItem;
use mirror_engine::{
    discover, Collection, CollectionPage, ContentSource, DiscoveryError, PageCollector,
    WpContentSource,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    mirror_logging::initialize_for_tests();
}

/// Serves a fixed page table; `next` links are looked up by page URL.
struct ScriptedSource {
    pages: HashMap<String, (Vec<String>, Option<String>)>,
    fail_on: Option<String>,
    fetches: AtomicUsize,
}

fn page_url(page: usize) -> String {
    format!("https://api.test/items?page={page}")
}

impl ScriptedSource {
    fn paged(total: usize, page_size: usize) -> (Self, Vec<String>) {
        let slugs: Vec<String> = (0..total).map(|i| format!("post-{i}")).collect();
        let chunks: Vec<_> = slugs.chunks(page_size).collect();
        let pages = chunks
            .iter()
            .enumerate()
            .map(|(idx, chunk)| {
                let next = (idx + 1 < chunks.len()).then(|| page_url(idx + 2));
                (page_url(idx + 1), (chunk.to_vec(), next))
            })
            .collect();
        let source = Self {
            pages,
            fail_on: None,
            fetches: AtomicUsize::new(0),
        };
        (source, slugs)
    }
}

#[async_trait::async_trait]
impl ContentSource for ScriptedSource {
    fn first_page(&self, _collection: Collection) -> Result<Url, DiscoveryError> {
        Ok(Url::parse(&page_url(1)).unwrap())
    }

    async fn fetch_page(&self, cursor: &Url) -> Result<CollectionPage, DiscoveryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.as_deref() == Some(cursor.as_str()) {
            return Err(DiscoveryError::HttpStatus {
                url: cursor.to_string(),
                status: 502,
            });
        }
        let (slugs, next) = self.pages.get(cursor.as_str()).cloned().unwrap_or_default();
        Ok(CollectionPage {
            items: slugs
                .into_iter()
                .map(|slug| RawItem {
                    slug,
                    ..RawItem::default()
                })
                .collect(),
            next: next.map(|n| Url::parse(&n).unwrap()),
            total_pages: None,
        })
    }
}

#[tokio::test]
async fn collects_every_item_in_order_with_one_fetch_per_page() {
    init_logging();
    let (source, slugs) = ScriptedSource::paged(23, 10);

    let items = PageCollector::default()
        .collect(&source, Collection::Posts)
        .await
        .unwrap();

    let collected: Vec<_> = items.into_iter().map(|i| i.slug).collect();
    assert_eq!(collected, slugs);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn cyclic_next_link_is_an_error_not_a_loop() {
    init_logging();
    let (mut source, _) = ScriptedSource::paged(20, 10);
    source.pages.insert(page_url(2), (vec!["loop".to_string()], Some(page_url(1))));

    let err = PageCollector::default()
        .collect(&source, Collection::Posts)
        .await
        .unwrap_err();

    assert!(matches!(err, DiscoveryError::PaginationCycle { .. }));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn page_limit_bounds_the_walk() {
    init_logging();
    let (source, _) = ScriptedSource::paged(50, 10);

    let err = PageCollector::new(3)
        .collect(&source, Collection::Pages)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DiscoveryError::PaginationLimit { max_pages: 3, .. }
    ));
}

#[tokio::test]
async fn mid_crawl_failure_aborts_the_collection() {
    init_logging();
    let (mut source, _) = ScriptedSource::paged(30, 10);
    source.fail_on = Some(page_url(2));

    let err = PageCollector::default()
        .collect(&source, Collection::Posts)
        .await
        .unwrap_err();

    match err {
        DiscoveryError::Pagination { page, source, .. } => {
            assert_eq!(page, 2);
            assert!(matches!(*source, DiscoveryError::HttpStatus { status: 502, .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn discovers_api_root_from_link_header() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header(
            "Link",
            format!("<{}/wp-json/>; rel=\"https://api.w.org/\"", server.uri()).as_str(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Day of REST",
            "description": "A conference",
            "url": server.uri(),
            "routes": {}
        })))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let discovery = discover(&client, &Url::parse(&server.uri()).unwrap())
        .await
        .unwrap();

    assert_eq!(discovery.api_root.as_str(), format!("{}/wp-json/", server.uri()));
    assert_eq!(discovery.site.name, "Day of REST");
    assert_eq!(discovery.site.description, "A conference");
}

#[tokio::test]
async fn site_without_api_link_fails_discovery() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = discover(
        &reqwest::Client::new(),
        &Url::parse(&server.uri()).unwrap(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DiscoveryError::NoApiLink(_)));
}

#[tokio::test]
async fn wp_source_follows_next_links_and_requests_embeds() {
    init_logging();
    let server = MockServer::start().await;
    let api_root = Url::parse(&format!("{}/wp-json", server.uri())).unwrap();

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("_embed", "1"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-TotalPages", "2")
                .set_body_json(json!([{ "slug": "third" }])),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("_embed", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-Total", "3")
                .insert_header("X-WP-TotalPages", "2")
                .insert_header(
                    "Link",
                    format!(
                        "<{}/wp-json/wp/v2/posts?per_page=2&page=2>; rel=\"next\"",
                        server.uri()
                    )
                    .as_str(),
                )
                .set_body_json(json!([
                    {
                        "slug": "first",
                        "_embedded": { "author": [{ "slug": "jane" }] }
                    },
                    { "slug": "second" }
                ])),
        )
        .mount(&server)
        .await;

    let source = WpContentSource::new(reqwest::Client::new(), api_root, 2);
    let items = PageCollector::default()
        .collect(&source, Collection::Posts)
        .await
        .unwrap();

    let slugs: Vec<_> = items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs, vec!["first", "second", "third"]);
    assert_eq!(items[0].primary_author().unwrap().slug, "jane");
}
