use std::collections::BTreeMap;

use crate::{NormalizedRecord, OrderedSet};

/// Structured inventory of the site: which posts and pages exist and which
/// posts every tag and author archive lists.
///
/// Buckets are kept in `BTreeMap`s so archive URLs come out sorted by slug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub posts: OrderedSet<String>,
    pub tags: BTreeMap<String, OrderedSet<String>>,
    pub authors: BTreeMap<String, OrderedSet<String>>,
    pub pages: OrderedSet<String>,
}

impl Manifest {
    pub fn build<'a, P, G>(posts: P, pages: G) -> Self
    where
        P: IntoIterator<Item = &'a NormalizedRecord>,
        G: IntoIterator<Item = &'a NormalizedRecord>,
    {
        let mut manifest = Self::default();
        for post in posts {
            manifest.index_post(post);
        }
        for page in pages {
            manifest.index_page(page);
        }
        manifest
    }

    pub fn index_post(&mut self, post: &NormalizedRecord) {
        if post.slug.is_empty() {
            return;
        }
        self.posts.insert(post.slug.clone());

        if !post.author_slug.is_empty() {
            self.authors
                .entry(post.author_slug.clone())
                .or_default()
                .insert(post.slug.clone());
        }
        for tag in &post.tag_slugs {
            self.tags
                .entry(tag.clone())
                .or_default()
                .insert(post.slug.clone());
        }
    }

    /// Pages never contribute to tag or author archives.
    pub fn index_page(&mut self, page: &NormalizedRecord) {
        if !page.slug.is_empty() {
            self.pages.insert(page.slug.clone());
        }
    }

    /// Posts followed by pages, each slug once, in first-seen order.
    pub fn all_slugs(&self) -> OrderedSet<String> {
        self.posts.iter().chain(self.pages.iter()).cloned().collect()
    }
}
