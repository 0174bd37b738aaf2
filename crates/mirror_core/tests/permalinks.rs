use std::collections::HashSet;

use mirror_core::{
    archive_page_count, derive_permalinks, Manifest, NormalizedRecord, PermalinkOptions,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    mirror_logging::initialize_for_tests();
}

fn post(slug: &str, author: &str, tags: &[&str]) -> NormalizedRecord {
    NormalizedRecord {
        slug: slug.to_string(),
        author_slug: author.to_string(),
        tag_slugs: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn site_with(posts: &[NormalizedRecord], pages: &[NormalizedRecord]) -> Vec<String> {
    let manifest = Manifest::build(posts, pages);
    derive_permalinks(&manifest, PermalinkOptions::default())
        .as_slice()
        .to_vec()
}

#[test]
fn empty_site_is_just_the_root() {
    init_logging();
    assert_eq!(site_with(&[], &[]), vec!["/".to_string()]);
}

#[test]
fn root_appears_once_even_with_a_root_like_slug() {
    init_logging();
    let links = site_with(&[post("", "", &[])], &[]);
    assert_eq!(links.iter().filter(|p| p.as_str() == "/").count(), 1);
}

#[test]
fn end_to_end_counts_match_archive_arithmetic() {
    init_logging();
    let posts: Vec<_> = (0..23)
        .map(|i| {
            let tags: &[&str] = if i < 15 { &["news"] } else { &[] };
            post(&format!("post-{i}"), "jane", tags)
        })
        .collect();

    let links = site_with(&posts, &[]);

    assert_eq!(links.len(), 29);
    assert_eq!(links[0], "/");
    let unique: HashSet<_> = links.iter().collect();
    assert_eq!(unique.len(), links.len());

    let tag_links: Vec<_> = links.iter().filter(|p| p.starts_with("/tag/news/")).collect();
    assert_eq!(tag_links, vec!["/tag/news/", "/tag/news/page/2/"]);
    assert_eq!(tag_links.len(), archive_page_count(15));

    let author_links: Vec<_> = links
        .iter()
        .filter(|p| p.starts_with("/author/jane/"))
        .collect();
    assert_eq!(
        author_links,
        vec![
            "/author/jane/",
            "/author/jane/page/2/",
            "/author/jane/page/3/"
        ]
    );
}

#[test]
fn archive_with_exactly_page_size_posts_has_no_second_page() {
    init_logging();
    let posts: Vec<_> = (0..10).map(|i| post(&format!("p{i}"), "", &["t"])).collect();
    let links = site_with(&posts, &[]);
    assert!(links.contains(&"/tag/t/".to_string()));
    assert!(!links.iter().any(|p| p.starts_with("/tag/t/page/")));
}

#[test]
fn archives_are_emitted_in_slug_order() {
    init_logging();
    let posts = vec![
        post("one", "zed", &["zeta", "alpha"]),
        post("two", "amy", &["mid"]),
    ];
    let links = site_with(&posts, &[]);
    assert_eq!(
        links,
        vec![
            "/",
            "/one/",
            "/two/",
            "/tag/alpha/",
            "/tag/mid/",
            "/tag/zeta/",
            "/author/amy/",
            "/author/zed/",
        ]
    );
}

#[test]
fn posts_and_pages_sharing_a_slug_yield_one_permalink() {
    init_logging();
    let links = site_with(&[post("about", "", &[])], &[post("about", "", &[])]);
    assert_eq!(links, vec!["/", "/about/"]);
}

#[test]
fn home_pagination_is_opt_in() {
    init_logging();
    let posts: Vec<_> = (0..21).map(|i| post(&format!("p{i}"), "", &[])).collect();
    let manifest = Manifest::build(&posts, std::iter::empty());

    let plain = derive_permalinks(&manifest, PermalinkOptions::default());
    assert!(!plain.contains("/page/2/"));

    let paged = derive_permalinks(
        &manifest,
        PermalinkOptions {
            paginate_home: true,
        },
    );
    assert!(paged.contains("/page/2/"));
    assert!(paged.contains("/page/3/"));
    assert!(!paged.contains("/page/4/"));
    assert_eq!(paged.len(), plain.len() + 2);
}
