use crate::{Manifest, OrderedSet};

/// Posts per archive page on the rendering server.
pub const ARCHIVE_PAGE_SIZE: usize = 10;

pub const ROOT: &str = "/";

pub fn post_permalink(slug: &str) -> String {
    format!("/{slug}/")
}

pub fn tag_archive(slug: &str) -> String {
    format!("/tag/{slug}/")
}

pub fn author_archive(slug: &str) -> String {
    format!("/author/{slug}/")
}

/// Number of listing pages an archive of `posts` entries spans.
pub fn archive_page_count(posts: usize) -> usize {
    posts.div_ceil(ARCHIVE_PAGE_SIZE)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermalinkOptions {
    /// Also emit `/page/<n>/` for the paginated home listing.
    pub paginate_home: bool,
}

/// Ordered, duplicate-free list of URL paths to mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermalinkSet {
    paths: OrderedSet<String>,
}

impl PermalinkSet {
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&path.to_string())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.paths.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        self.paths.as_slice()
    }

    fn push_archive(&mut self, root: String, posts: usize) {
        let pages = archive_page_count(posts);
        self.paths.insert(root.clone());
        for page in 2..=pages {
            self.paths.insert(format!("{root}page/{page}/"));
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PermalinkSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PermalinkSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// Every URL the rendering server answers for this manifest.
///
/// Order: `/`, single items, tag archives, author archives, then home pages.
pub fn derive_permalinks(manifest: &Manifest, options: PermalinkOptions) -> PermalinkSet {
    let mut set = PermalinkSet::default();
    set.paths.insert(ROOT.to_string());

    for slug in &manifest.all_slugs() {
        set.paths.insert(post_permalink(slug));
    }
    for (slug, posts) in &manifest.tags {
        set.push_archive(tag_archive(slug), posts.len());
    }
    for (slug, posts) in &manifest.authors {
        set.push_archive(author_archive(slug), posts.len());
    }
    if options.paginate_home {
        for page in 2..=archive_page_count(manifest.posts.len()) {
            set.paths.insert(format!("/page/{page}/"));
        }
    }
    set
}
