use std::path::PathBuf;
use std::sync::Arc;

use mirror_core::{
    derive_permalinks, Manifest, Normalizer, PermalinkOptions, PermalinkSet,
    DEFAULT_TAG_TAXONOMIES,
};
use mirror_logging::{mirror_info, mirror_warn};
use thiserror::Error;
use url::Url;

use crate::assets::{AssetCopier, AssetError};
use crate::collect::{PageCollector, DEFAULT_MAX_PAGES};
use crate::discovery::{discover, discover_from_root, Discovery, DiscoveryError, SiteInfo};
use crate::fetch::{build_client, FetchSettings, MirrorFetcher, ProgressSink, ReqwestFetcher};
use crate::materialize::{materialize, MaterializeError};
use crate::source::{Collection, ContentSource, WpContentSource, DEFAULT_PER_PAGE};
use crate::{FetchError, FetchOutcome, PermalinkOutcome};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FATAL: u8 = 1;
/// Only returned in strict mode, when at least one page could not be mirrored.
pub const EXIT_FETCH_FAILURES: u8 = 2;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
    #[error("could not prepare output directory: {0}")]
    Materialize(#[from] MaterializeError),
    #[error("could not copy assets: {0}")]
    Assets(#[from] AssetError),
    #[error("could not build http client: {0}")]
    Client(#[from] FetchError),
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Public site whose `Link` header advertises the content API.
    pub site_url: Url,
    /// Skips `Link` discovery when set.
    pub api_root: Option<Url>,
    pub output_dir: PathBuf,
    pub theme_assets: PathBuf,
    pub global_assets: PathBuf,
    pub per_page: usize,
    pub max_pages: usize,
    pub tag_taxonomies: Vec<String>,
    pub permalinks: PermalinkOptions,
    pub fetch: FetchSettings,
}

impl MirrorConfig {
    pub fn new(site_url: Url, output_dir: PathBuf) -> Self {
        Self {
            site_url,
            api_root: None,
            output_dir,
            theme_assets: PathBuf::from("theme/assets"),
            global_assets: PathBuf::from("assets"),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            tag_taxonomies: DEFAULT_TAG_TAXONOMIES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            permalinks: PermalinkOptions::default(),
            fetch: FetchSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorReport {
    pub site: SiteInfo,
    pub permalinks: PermalinkSet,
    pub outcomes: Vec<PermalinkOutcome>,
    pub assets_copied: usize,
}

impl MirrorReport {
    pub fn failures(&self) -> impl Iterator<Item = &PermalinkOutcome> {
        self.outcomes.iter().filter(|o| o.outcome.is_failed())
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn done_count(&self) -> usize {
        self.outcomes.len() - self.failed_count()
    }

    pub fn bytes_written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.outcome {
                FetchOutcome::Done { bytes_written } => bytes_written,
                FetchOutcome::Failed(_) => 0,
            })
            .sum()
    }

    /// Fetch failures only affect the exit code in strict mode.
    pub fn exit_code(&self, strict: bool) -> u8 {
        if strict && self.failed_count() > 0 {
            EXIT_FETCH_FAILURES
        } else {
            EXIT_OK
        }
    }

    pub fn log_summary(&self) {
        mirror_info!(
            "Mirrored {}/{} pages ({} bytes), {} asset files",
            self.done_count(),
            self.outcomes.len(),
            self.bytes_written(),
            self.assets_copied
        );
        for failure in self.failures() {
            if let FetchOutcome::Failed(err) = &failure.outcome {
                mirror_warn!("Not mirrored: {} ({})", failure.permalink, err);
            }
        }
    }
}

/// The full discover → plan → materialize → fetch → assets run.
pub struct Mirror {
    config: MirrorConfig,
    client: reqwest::Client,
}

impl Mirror {
    pub fn new(config: MirrorConfig) -> Result<Self, MirrorError> {
        let client = build_client(&config.fetch)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub async fn discover(&self) -> Result<Discovery, DiscoveryError> {
        match &self.config.api_root {
            Some(api_root) => discover_from_root(&self.client, api_root.clone()).await,
            None => discover(&self.client, &self.config.site_url).await,
        }
    }

    /// A content source for the discovered API, sharing this mirror's client.
    pub fn content_source(&self, discovery: &Discovery) -> WpContentSource {
        WpContentSource::new(
            self.client.clone(),
            discovery.api_root.clone(),
            self.config.per_page,
        )
    }

    /// Crawls posts then pages and derives the permalinks to mirror.
    pub async fn plan(&self, source: &dyn ContentSource) -> Result<PermalinkSet, DiscoveryError> {
        let collector = PageCollector::new(self.config.max_pages);
        let normalizer = Normalizer::new(self.config.tag_taxonomies.iter().cloned());

        let posts: Vec<_> = collector
            .collect(source, Collection::Posts)
            .await?
            .iter()
            .map(|item| normalizer.normalize(item))
            .collect();
        let pages: Vec<_> = collector
            .collect(source, Collection::Pages)
            .await?
            .iter()
            .map(|item| normalizer.normalize(item))
            .collect();

        let manifest = Manifest::build(&posts, &pages);
        let permalinks = derive_permalinks(&manifest, self.config.permalinks);
        mirror_info!(
            "Planned {} permalinks: {} posts, {} pages, {} tags, {} authors",
            permalinks.len(),
            manifest.posts.len(),
            manifest.pages.len(),
            manifest.tags.len(),
            manifest.authors.len()
        );
        Ok(permalinks)
    }

    pub async fn run(&self, sink: &dyn ProgressSink) -> Result<MirrorReport, MirrorError> {
        let discovery = self.discover().await?;
        let source = self.content_source(&discovery);
        let permalinks = self.plan(&source).await?;

        let output_dir = &self.config.output_dir;
        materialize(output_dir, &permalinks).await?;

        let fetcher = Arc::new(ReqwestFetcher::with_client(
            self.client.clone(),
            self.config.fetch.origin.clone(),
        ));
        let outcomes = MirrorFetcher::new(fetcher, self.config.fetch.batch_size)
            .run(output_dir, &permalinks, sink)
            .await;

        let assets = AssetCopier::new(&self.config.theme_assets, &self.config.global_assets);
        let assets_copied = assets.copy_into(output_dir).await?;

        Ok(MirrorReport {
            site: discovery.site,
            permalinks,
            outcomes,
            assets_copied,
        })
    }
}
