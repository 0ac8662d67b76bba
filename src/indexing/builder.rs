//! The metadata walk that fills a fresh, unpublished index

use anyhow::Context;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{SkipCollector, SkipStage};
use super::progress::{BuildPhase, IndexProgress, ProgressSink};
use super::report::BuildReport;
use crate::config::IndexerConfig;
use crate::error::IndexResult;
use crate::index::{IndexSnapshot, SearchIndex, SearchResult, Tokenizer};
use crate::metadata::{Field, Method, Module, TypeDefinition, TypeKey};
use crate::metrics::SKIPPED_BRANCHES;
use crate::source::MetadataSource;

/// How a walk ended
pub enum WalkOutcome {
    Finished(IndexSnapshot),
    Cancelled,
}

/// One build's worth of state. Nothing here is visible to readers until the
/// finished snapshot is published.
pub struct IndexBuilder<'a> {
    source: &'a dyn MetadataSource,
    cancel: &'a CancellationToken,
    progress_sink: Option<&'a dyn ProgressSink>,
    progress: IndexProgress,
    index: SearchIndex,
    modules: Vec<Arc<Module>>,
    type_definitions: Vec<Arc<TypeDefinition>>,
    methods_by_type: HashMap<TypeKey, Arc<[Method]>>,
    fields_by_type: HashMap<TypeKey, Arc<[Field]>>,
    method_count: usize,
    field_count: usize,
    skips: SkipCollector,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        source: &'a dyn MetadataSource,
        config: &IndexerConfig,
        cancel: &'a CancellationToken,
        progress_sink: Option<&'a dyn ProgressSink>,
    ) -> Self {
        Self {
            source,
            cancel,
            progress_sink,
            progress: IndexProgress::default(),
            index: SearchIndex::new(Tokenizer::new(config.min_token_len), config.index_paths),
            modules: Vec::new(),
            type_definitions: Vec::new(),
            methods_by_type: HashMap::new(),
            fields_by_type: HashMap::new(),
            method_count: 0,
            field_count: 0,
            skips: SkipCollector::default(),
        }
    }

    /// Walk domains, modules, types and members, then assemble the snapshot.
    ///
    /// Only a failure to enumerate domains aborts the walk; every narrower
    /// failure skips its branch.
    pub fn run(mut self) -> IndexResult<WalkOutcome> {
        let started = Instant::now();
        let build_id = Uuid::new_v4();
        info!(%build_id, source = self.source.source_name(), "Walking metadata source");

        if self.cancel.is_cancelled() {
            return Ok(WalkOutcome::Cancelled);
        }
        let domains = self
            .source
            .enumerate_domains()
            .context("Failed to enumerate domains")?;

        let mut modules = Vec::new();
        for domain in &domains {
            if self.cancel.is_cancelled() {
                return Ok(WalkOutcome::Cancelled);
            }
            match self.source.enumerate_modules(domain) {
                Ok(found) => modules.extend(found),
                Err(e) => self.skip(SkipStage::Domain, &domain.name, e),
            }
        }

        self.progress.total_modules = modules.len();
        self.report();
        debug!(domains = domains.len(), modules = modules.len(), "Enumerated modules");

        for (position, module) in modules.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(WalkOutcome::Cancelled);
            }
            let module = Arc::new(module);

            self.progress.phase = BuildPhase::Module;
            self.progress.modules_processed = position;
            self.progress.type_defs_processed = 0;
            self.progress.total_type_defs = 0;
            self.progress.current_item = module.name.clone();
            self.report();

            self.index
                .insert(Arc::new(SearchResult::for_module(module.clone())));
            self.modules.push(module.clone());

            let type_defs = match self.source.enumerate_type_definitions(&module) {
                Ok(type_defs) => type_defs,
                Err(e) => {
                    self.skip(SkipStage::Module, &module.name, e);
                    continue;
                }
            };

            self.progress.total_type_defs = type_defs.len();
            debug!(module = %module.name, types = type_defs.len(), "Indexing module");

            for (type_position, type_def) in type_defs.into_iter().enumerate() {
                if self.cancel.is_cancelled() {
                    return Ok(WalkOutcome::Cancelled);
                }
                let type_def = Arc::new(type_def);

                self.progress.phase = BuildPhase::TypeDefinition;
                self.progress.type_defs_processed = type_position;
                self.progress.current_item = type_def.name.clone();
                self.report();

                if let Some(outcome) = self.index_type(&module, type_def) {
                    return Ok(outcome);
                }
            }
        }

        self.progress.phase = BuildPhase::Publishing;
        self.progress.modules_processed = self.progress.total_modules;
        self.progress.type_defs_processed = 0;
        self.progress.total_type_defs = 0;
        self.progress.current_item.clear();
        self.report();

        Ok(WalkOutcome::Finished(self.finish(build_id, started)))
    }

    /// Register a type and its members. Returns `Some` when cancelled midway.
    fn index_type(
        &mut self,
        module: &Arc<Module>,
        type_def: Arc<TypeDefinition>,
    ) -> Option<WalkOutcome> {
        self.index.insert(Arc::new(SearchResult::for_type(
            module.clone(),
            type_def.clone(),
        )));
        self.type_definitions.push(type_def.clone());

        if self.cancel.is_cancelled() {
            return Some(WalkOutcome::Cancelled);
        }
        match type_def.methods(self.source) {
            Ok(methods) => {
                for method in methods.iter() {
                    self.index.insert(Arc::new(SearchResult::for_method(
                        module.clone(),
                        type_def.clone(),
                        Arc::new(method.clone()),
                    )));
                }
                self.method_count += methods.len();
                self.methods_by_type.insert(type_def.key(), methods);
            }
            Err(e) => self.skip(SkipStage::Methods, &type_def.name, e),
        }

        if self.cancel.is_cancelled() {
            return Some(WalkOutcome::Cancelled);
        }
        match type_def.fields(self.source) {
            Ok(fields) => {
                for field in fields.iter() {
                    self.index.insert(Arc::new(SearchResult::for_field(
                        module.clone(),
                        type_def.clone(),
                        Arc::new(field.clone()),
                    )));
                }
                self.field_count += fields.len();
                self.fields_by_type.insert(type_def.key(), fields);
            }
            Err(e) => self.skip(SkipStage::Fields, &type_def.name, e),
        }

        None
    }

    fn skip(&mut self, stage: SkipStage, entity: &str, error: anyhow::Error) {
        warn!(stage = %stage, entity, error = %format!("{:#}", error), "Skipping branch");
        SKIPPED_BRANCHES.inc();
        self.skips.record(stage, entity, &error);
    }

    fn report(&self) {
        if let Some(sink) = self.progress_sink {
            sink.report(&self.progress);
        }
    }

    fn finish(self, build_id: Uuid, started: Instant) -> IndexSnapshot {
        let report = BuildReport {
            build_id,
            modules: self.modules.len(),
            type_definitions: self.type_definitions.len(),
            methods: self.method_count,
            fields: self.field_count,
            records: self.index.record_count(),
            keys: self.index.key_count(),
            skipped: self.skips.into_summary(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            completed_at: Some(Utc::now()),
        };

        IndexSnapshot {
            index: self.index,
            modules: self.modules,
            type_definitions: self.type_definitions,
            methods_by_type: self.methods_by_type,
            fields_by_type: self.fields_by_type,
            built_at: report.completed_at.unwrap_or_else(Utc::now),
            report,
        }
    }
}
