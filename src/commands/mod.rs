//! Command implementations behind the `metascope` binary

pub mod init;
pub mod search;
pub mod stats;

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::indexing::{BuildOutcome, BuildReport, ProgressBarSink, ProgressSink};
use crate::source::{Snapshot, SnapshotSource};
use crate::{Config, MetadataIndex};

/// Load a snapshot, build its index and hand back the ready service.
///
/// Ctrl-C cancels the build.
pub(crate) async fn index_snapshot(
    path: &Path,
    config: &Config,
) -> Result<(MetadataIndex, BuildReport)> {
    let source = SnapshotSource::new(Snapshot::load(path)?);
    info!("Loaded metadata snapshot from {:?}", path);

    let index = MetadataIndex::new(Arc::new(source), config);
    let bar = Arc::new(ProgressBarSink::new("Indexing"));
    let sink: Arc<dyn ProgressSink> = bar.clone();

    let handle = index.start_build(Some(sink), None)?;
    let cancel = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let outcome = handle.wait().await;
    interrupt.abort();

    match outcome? {
        BuildOutcome::Completed(report) => {
            bar.finish("done");
            Ok((index, report))
        }
        BuildOutcome::Cancelled => {
            bar.finish("cancelled");
            bail!("Indexing was cancelled")
        }
    }
}
