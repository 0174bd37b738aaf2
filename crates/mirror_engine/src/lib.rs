//! Mirror engine: discovery, crawling and the fetch/write pipeline.
mod assets;
mod collect;
mod discovery;
mod fetch;
mod link_header;
mod materialize;
mod persist;
mod pipeline;
mod source;
mod types;

pub use assets::{AssetCopier, AssetError, AssetMapping};
pub use collect::{PageCollector, DEFAULT_MAX_PAGES};
pub use discovery::{
    discover, discover_from_root, Discovery, DiscoveryError, SiteInfo, API_LINK_REL,
};
pub use fetch::{
    FetchSettings, Fetcher, MirrorFetcher, NullProgressSink, ProgressSink, ReqwestFetcher,
    DEFAULT_BATCH_SIZE, DEFAULT_ORIGIN,
};
pub use link_header::{find_link, parse_link_header, LinkEntry};
pub use materialize::{materialize, permalink_dir, MaterializeError, INDEX_FILE};
#[cfg(unix)]
pub use persist::INDEX_FILE_MODE;
pub use persist::{IndexFileWriter, PendingIndexFile, PersistError};
pub use pipeline::{
    Mirror, MirrorConfig, MirrorError, MirrorReport, EXIT_FATAL, EXIT_FETCH_FAILURES, EXIT_OK,
};
pub use source::{Collection, CollectionPage, ContentSource, WpContentSource, DEFAULT_PER_PAGE};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchOutcome, FetchProgress, PermalinkOutcome, Stage,
};
