use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::errors::SkipSummary;

/// Statistics of one completed build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub build_id: Uuid,
    pub modules: usize,
    pub type_definitions: usize,
    pub methods: usize,
    pub fields: usize,
    /// Distinct records in the index (entities with blank names excluded)
    pub records: usize,
    pub keys: usize,
    pub skipped: SkipSummary,
    pub elapsed_ms: u64,
    pub completed_at: Option<DateTime<Utc>>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modules, {} types, {} methods, {} fields -> {} records under {} keys in {} ms ({})",
            self.modules,
            self.type_definitions,
            self.methods,
            self.fields,
            self.records,
            self.keys,
            self.elapsed_ms,
            self.skipped
        )
    }
}
