//! Collection of enumeration branches skipped during a build

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Enumeration unit that failed
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize)]
pub enum SkipStage {
    /// Module list of one domain
    Domain,
    /// Type definitions of one module
    Module,
    /// Methods of one type
    Methods,
    /// Fields of one type
    Fields,
}

impl fmt::Display for SkipStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipStage::Domain => write!(f, "Domain"),
            SkipStage::Module => write!(f, "Module"),
            SkipStage::Methods => write!(f, "Methods"),
            SkipStage::Fields => write!(f, "Fields"),
        }
    }
}

/// One skipped branch
#[derive(Debug, Clone, Serialize)]
pub struct SkippedBranch {
    pub stage: SkipStage,
    /// Name of the domain, module or type whose enumeration failed
    pub entity: String,
    pub error: String,
}

/// Gathers skipped branches for one build.
///
/// Keeps at most `max_kept` entries verbatim; everything past that is only
/// counted.
#[derive(Debug)]
pub struct SkipCollector {
    skipped: Vec<SkippedBranch>,
    by_stage: HashMap<SkipStage, usize>,
    total: usize,
    max_kept: usize,
}

impl SkipCollector {
    pub fn new(max_kept: usize) -> Self {
        Self {
            skipped: Vec::new(),
            by_stage: HashMap::new(),
            total: 0,
            max_kept,
        }
    }

    pub fn record(&mut self, stage: SkipStage, entity: &str, error: &anyhow::Error) {
        self.total += 1;
        *self.by_stage.entry(stage).or_default() += 1;
        if self.skipped.len() < self.max_kept {
            self.skipped.push(SkippedBranch {
                stage,
                entity: entity.to_string(),
                error: format!("{:#}", error),
            });
        }
    }

    pub fn into_summary(self) -> SkipSummary {
        SkipSummary {
            total: self.total,
            by_stage: self.by_stage,
            samples: self.skipped,
        }
    }
}

impl Default for SkipCollector {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Skipped branches grouped by stage
#[derive(Debug, Clone, Default, Serialize)]
pub struct SkipSummary {
    pub total: usize,
    pub by_stage: HashMap<SkipStage, usize>,
    pub samples: Vec<SkippedBranch>,
}

impl SkipSummary {
    pub fn has_skips(&self) -> bool {
        self.total > 0
    }

    pub fn count(&self, stage: SkipStage) -> usize {
        self.by_stage.get(&stage).copied().unwrap_or(0)
    }
}

impl fmt::Display for SkipSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return write!(f, "no branches skipped");
        }
        write!(f, "{} branches skipped", self.total)?;
        let mut stages: Vec<_> = self.by_stage.iter().collect();
        stages.sort_by_key(|(stage, _)| stage.to_string());
        for (stage, count) in stages {
            write!(f, ", {}: {}", stage, count)?;
        }
        Ok(())
    }
}
