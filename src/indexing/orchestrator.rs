//! Single-flight build control
//!
//! A build claims the building flag, walks the source on a blocking worker and
//! publishes the result into the [`IndexStore`]. The flag is released by a
//! guard that lives inside the worker, so it is released however the worker
//! ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::builder::{IndexBuilder, WalkOutcome};
use super::progress::{BuildPhase, IndexProgress, ProgressSink};
use super::report::BuildReport;
use crate::config::IndexerConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::IndexStore;
use crate::metrics::{
    BUILDS_CANCELLED, BUILDS_COMPLETED, BUILDS_FAILED, BUILDS_STARTED, BUILD_DURATION,
    INDEXED_KEYS, INDEXED_RECORDS,
};
use crate::source::{MetadataSource, SerializedSource};

/// How a build ended when it did not fail
#[derive(Debug, Clone)]
pub enum BuildOutcome {
    /// A new index was published
    Completed(BuildReport),
    /// Stopped before publishing; the previous index is untouched
    Cancelled,
}

impl BuildOutcome {
    pub fn report(&self) -> Option<&BuildReport> {
        match self {
            BuildOutcome::Completed(report) => Some(report),
            BuildOutcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildOutcome::Cancelled)
    }
}

/// Releases the building flag on drop
struct BuildingGuard {
    flag: Arc<AtomicBool>,
}

impl BuildingGuard {
    fn claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: flag.clone() })
    }
}

impl Drop for BuildingGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A running build
pub struct BuildHandle {
    task: JoinHandle<IndexResult<BuildOutcome>>,
    cancel: CancellationToken,
}

impl BuildHandle {
    /// Ask the build to stop at its next checkpoint
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the build to end
    pub async fn wait(self) -> IndexResult<BuildOutcome> {
        self.task
            .await
            .map_err(|e| IndexError::Worker(format!("build task failed: {}", e)))?
    }
}

/// Starts builds and publishes their results
#[derive(Clone)]
pub struct BuildOrchestrator {
    source: Arc<SerializedSource>,
    store: Arc<IndexStore>,
    config: IndexerConfig,
    building: Arc<AtomicBool>,
}

impl BuildOrchestrator {
    pub fn new(source: Arc<SerializedSource>, store: Arc<IndexStore>, config: IndexerConfig) -> Self {
        Self {
            source,
            store,
            config,
            building: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::Acquire)
    }

    /// Start a build on a blocking worker.
    ///
    /// Fails right away with [`IndexError::AlreadyBuilding`] while another
    /// build runs and with [`IndexError::NotAttached`] when the source is not
    /// reachable. Must be called from within a tokio runtime.
    pub fn start_build(
        &self,
        progress: Option<Arc<dyn ProgressSink>>,
        cancel: Option<CancellationToken>,
    ) -> IndexResult<BuildHandle> {
        let guard = BuildingGuard::claim(&self.building).ok_or(IndexError::AlreadyBuilding)?;

        if !self.source.is_reachable() {
            warn!(source = self.source.source_name(), "Build requested but source is not reachable");
            return Err(IndexError::NotAttached);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| IndexError::Worker(format!("no tokio runtime: {}", e)))?;

        let cancel = cancel.unwrap_or_else(CancellationToken::new);
        let worker = BuildWorker {
            source: self.source.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            cancel: cancel.clone(),
            progress,
        };

        BUILDS_STARTED.inc();
        let task = runtime.spawn_blocking(move || {
            let _guard = guard;
            worker.run()
        });

        Ok(BuildHandle { task, cancel })
    }

    /// Start a build and wait for it
    pub async fn build_index(
        &self,
        progress: Option<Arc<dyn ProgressSink>>,
        cancel: Option<CancellationToken>,
    ) -> IndexResult<BuildOutcome> {
        self.start_build(progress, cancel)?.wait().await
    }
}

/// Everything the blocking worker owns
struct BuildWorker {
    source: Arc<SerializedSource>,
    store: Arc<IndexStore>,
    config: IndexerConfig,
    cancel: CancellationToken,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl BuildWorker {
    fn run(self) -> IndexResult<BuildOutcome> {
        let walk = IndexBuilder::new(
            &*self.source,
            &self.config,
            &self.cancel,
            self.progress.as_deref(),
        )
        .run();

        let snapshot = match walk {
            Ok(WalkOutcome::Finished(snapshot)) => snapshot,
            Ok(WalkOutcome::Cancelled) => {
                BUILDS_CANCELLED.inc();
                info!("Index build cancelled, keeping the previous index");
                return Ok(BuildOutcome::Cancelled);
            }
            Err(e) => {
                BUILDS_FAILED.inc();
                error!(error = %e, "Index build failed");
                return Err(e);
            }
        };

        let report = snapshot.report.clone();
        let generation = self.store.publish(snapshot);

        INDEXED_RECORDS.set(report.records as f64);
        INDEXED_KEYS.set(report.keys as f64);
        BUILD_DURATION.observe(report.elapsed_ms as f64 / 1000.0);
        BUILDS_COMPLETED.inc();

        if let Some(sink) = &self.progress {
            sink.report(&IndexProgress {
                phase: BuildPhase::Done,
                modules_processed: report.modules,
                total_modules: report.modules,
                ..Default::default()
            });
        }

        info!(build_id = %report.build_id, generation, "Index build finished: {}", report);
        Ok(BuildOutcome::Completed(report))
    }
}
