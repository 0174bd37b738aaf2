//! Mirror core: pure content model, normalization and permalink planning.
mod manifest;
mod normalize;
mod ordered;
mod permalink;
mod raw;

pub use manifest::Manifest;
pub use normalize::{NormalizedRecord, Normalizer, DEFAULT_TAG_TAXONOMIES};
pub use ordered::OrderedSet;
pub use permalink::{
    archive_page_count, author_archive, derive_permalinks, post_permalink, tag_archive,
    PermalinkOptions, PermalinkSet, ARCHIVE_PAGE_SIZE, ROOT,
};
pub use raw::{Embedded, RawAuthor, RawItem, RawTerm};
