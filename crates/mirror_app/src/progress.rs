use std::sync::atomic::{AtomicUsize, Ordering};

use mirror_engine::{EngineEvent, FetchOutcome, ProgressSink, Stage};
use mirror_logging::{mirror_info, mirror_trace};

/// Turns engine events into `[done/total]` log lines.
#[derive(Debug, Default)]
pub struct LogProgressSink {
    queued: AtomicUsize,
    settled: AtomicUsize,
}

impl LogProgressSink {
    pub fn settled(&self) -> usize {
        self.settled.load(Ordering::SeqCst)
    }
}

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::Progress(progress) => {
                if progress.stage == Stage::Pending {
                    self.queued.fetch_add(1, Ordering::SeqCst);
                }
                mirror_trace!(
                    "{} {:?} {:?}",
                    progress.permalink,
                    progress.stage,
                    progress.bytes
                );
            }
            EngineEvent::Completed { permalink, outcome } => {
                let settled = self.settled.fetch_add(1, Ordering::SeqCst) + 1;
                let queued = self.queued.load(Ordering::SeqCst);
                match outcome {
                    FetchOutcome::Done { bytes_written } => {
                        mirror_info!("[{settled}/{queued}] {permalink} ({bytes_written} bytes)");
                    }
                    FetchOutcome::Failed(err) => {
                        mirror_info!("[{settled}/{queued}] {permalink} failed: {err}");
                    }
                }
            }
        }
    }
}
