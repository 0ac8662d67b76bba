//! Build progress snapshots and sinks

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Resolution of the progress bar, in steps per 100 percent
const BAR_STEPS: u64 = 1000;

/// What the walk is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BuildPhase {
    #[default]
    Enumerating,
    Module,
    TypeDefinition,
    Publishing,
    Done,
}

/// Snapshot of a running build.
///
/// Counters only move forward within one build, except `type_defs_*` which
/// restart with every module.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexProgress {
    pub phase: BuildPhase,
    pub modules_processed: usize,
    pub total_modules: usize,
    pub type_defs_processed: usize,
    pub total_type_defs: usize,
    pub current_item: String,
}

impl IndexProgress {
    /// Completion estimate in `0.0..=100.0`.
    ///
    /// Finished modules count fully; the current module contributes its
    /// type-definition fraction scaled down by the module count.
    pub fn percent(&self) -> f64 {
        if self.phase == BuildPhase::Done {
            return 100.0;
        }
        if self.total_modules == 0 {
            return 0.0;
        }

        let modules = self.total_modules as f64;
        let mut done = self.modules_processed as f64 / modules;
        if self.total_type_defs > 0 {
            done += (self.type_defs_processed as f64 / self.total_type_defs as f64) / modules;
        }
        (done * 100.0).clamp(0.0, 100.0)
    }
}

/// Receiver of progress updates.
///
/// Called synchronously from the build worker; keep it cheap.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &IndexProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&IndexProgress) + Send + Sync,
{
    fn report(&self, progress: &IndexProgress) {
        self(progress)
    }
}

/// Renders build progress on an indicatif bar
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(BAR_STEPS);
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] {}: [{{bar:40.cyan/blue}}] {{percent}}% {{msg}}",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Self { bar }
    }

    /// Drive an existing bar, e.g. one added to a `MultiProgress`
    pub fn with_bar(bar: ProgressBar) -> Self {
        bar.set_length(BAR_STEPS);
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl ProgressSink for ProgressBarSink {
    fn report(&self, progress: &IndexProgress) {
        let position = (progress.percent() / 100.0 * BAR_STEPS as f64) as u64;
        self.bar.set_position(position);
        self.bar.set_message(progress.current_item.clone());
    }
}
