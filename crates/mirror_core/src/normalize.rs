use crate::{OrderedSet, RawItem};

/// Taxonomies whose terms are treated as tags. The rendering theme shows
/// categories as tags, so that is the default.
pub const DEFAULT_TAG_TAXONOMIES: &[&str] = &["category"];

/// The parts of a content item that decide which URLs exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub slug: String,
    /// Empty when the item carried no embedded author.
    pub author_slug: String,
    pub tag_slugs: OrderedSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalizer {
    tag_taxonomies: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_TAXONOMIES.iter().map(|t| t.to_string()))
    }
}

impl Normalizer {
    pub fn new(tag_taxonomies: impl IntoIterator<Item = String>) -> Self {
        Self {
            tag_taxonomies: tag_taxonomies.into_iter().collect(),
        }
    }

    pub fn normalize(&self, item: &RawItem) -> NormalizedRecord {
        let author_slug = item
            .primary_author()
            .map(|author| author.slug.clone())
            .unwrap_or_default();

        let tag_slugs = item
            .terms()
            .into_iter()
            .filter(|term| !term.slug.is_empty() && self.is_tag_taxonomy(&term.taxonomy))
            .map(|term| term.slug)
            .collect();

        NormalizedRecord {
            slug: item.slug.clone(),
            author_slug,
            tag_slugs,
        }
    }

    fn is_tag_taxonomy(&self, taxonomy: &str) -> bool {
        self.tag_taxonomies.iter().any(|t| t == taxonomy)
    }
}
