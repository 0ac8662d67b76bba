//! Index build implementation

pub mod builder;
pub mod errors;
pub mod orchestrator;
pub mod progress;
pub mod report;

pub use builder::{IndexBuilder, WalkOutcome};
pub use errors::{SkipCollector, SkipStage, SkipSummary, SkippedBranch};
pub use orchestrator::{BuildHandle, BuildOrchestrator, BuildOutcome};
pub use progress::{BuildPhase, IndexProgress, ProgressBarSink, ProgressSink};
pub use report::BuildReport;
