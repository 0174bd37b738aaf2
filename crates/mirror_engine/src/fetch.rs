use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use futures_util::StreamExt;
use mirror_core::PermalinkSet;
use mirror_logging::{mirror_debug, mirror_warn};
use url::Url;

use crate::materialize::permalink_dir;
use crate::persist::{IndexFileWriter, PersistError};
use crate::{
    EngineEvent, FailureKind, FetchError, FetchOutcome, FetchProgress, PermalinkOutcome, Stage,
};

/// Base URL of the local rendering server.
pub const DEFAULT_ORIGIN: &str = "http://localhost:3456/";

/// Fetches started together; the next batch waits for all of them to settle.
pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub origin: Url,
    pub batch_size: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_ORIGIN).expect("default origin is a valid url"),
            batch_size: DEFAULT_BATCH_SIZE,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: EngineEvent) {}
}

/// Retrieves one permalink's HTML into `dest_dir/index.html`.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        permalink: &str,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl ReqwestFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        Ok(Self::with_client(build_client(settings)?, settings.origin.clone()))
    }

    pub fn with_client(client: reqwest::Client, origin: Url) -> Self {
        Self {
            client,
            origin: crate::discovery::with_trailing_slash(origin),
        }
    }

    pub fn url_for(&self, permalink: &str) -> Result<Url, FetchError> {
        self.origin
            .join(permalink.trim_start_matches('/'))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

/// Client shared by discovery, crawling and page fetches.
pub(crate) fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(
        &self,
        permalink: &str,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<u64, FetchError> {
        let url = self.url_for(permalink)?;
        emit_stage(sink, permalink, Stage::Fetching, None);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("{url}: {status}"),
            ));
        }

        let writer = IndexFileWriter::new(dest_dir.to_path_buf());
        let mut pending = writer.begin().map_err(map_persist_error)?;
        emit_stage(sink, permalink, Stage::Writing, Some(0));

        // `pending` drops on every early return below, taking the temp file with it.
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            pending
                .write_chunk(&chunk)
                .await
                .map_err(map_persist_error)?;
            emit_stage(sink, permalink, Stage::Writing, Some(pending.written()));
        }

        pending.commit().await.map_err(map_persist_error)
    }
}

/// Fetches every permalink in fixed-size batches, one batch at a time.
///
/// A failure is recorded against its permalink only; siblings and later
/// batches still run.
pub struct MirrorFetcher {
    fetcher: Arc<dyn Fetcher>,
    batch_size: usize,
}

impl MirrorFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, batch_size: usize) -> Self {
        Self {
            fetcher,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn run(
        &self,
        output_dir: &Path,
        permalinks: &PermalinkSet,
        sink: &dyn ProgressSink,
    ) -> Vec<PermalinkOutcome> {
        for permalink in permalinks {
            emit_stage(sink, permalink, Stage::Pending, None);
        }

        let mut outcomes = Vec::with_capacity(permalinks.len());
        for (index, batch) in permalinks.as_slice().chunks(self.batch_size).enumerate() {
            mirror_debug!("Batch {} with {} permalinks", index + 1, batch.len());
            let settled = join_all(
                batch
                    .iter()
                    .map(|permalink| self.fetch_one(output_dir, permalink, sink)),
            )
            .await;
            outcomes.extend(settled);
        }
        outcomes
    }

    async fn fetch_one(
        &self,
        output_dir: &Path,
        permalink: &str,
        sink: &dyn ProgressSink,
    ) -> PermalinkOutcome {
        let result = match permalink_dir(output_dir, permalink) {
            Ok(dir) => self.fetcher.fetch(permalink, &dir, sink).await,
            Err(err) => Err(FetchError::new(FailureKind::InvalidPermalink, err.to_string())),
        };

        let outcome = match result {
            Ok(bytes_written) => FetchOutcome::Done { bytes_written },
            Err(err) => {
                mirror_warn!("Fetching {} failed: {}", permalink, err);
                FetchOutcome::Failed(err)
            }
        };
        sink.emit(EngineEvent::Completed {
            permalink: permalink.to_string(),
            outcome: outcome.clone(),
        });
        PermalinkOutcome {
            permalink: permalink.to_string(),
            outcome,
        }
    }
}

fn emit_stage(sink: &dyn ProgressSink, permalink: &str, stage: Stage, bytes: Option<u64>) {
    sink.emit(EngineEvent::Progress(FetchProgress {
        permalink: permalink.to_string(),
        stage,
        bytes,
    }));
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

fn map_persist_error(err: PersistError) -> FetchError {
    FetchError::new(FailureKind::Io, err.to_string())
}
