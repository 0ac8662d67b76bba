//! Public facade over build, store and query

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::{IndexError, IndexResult};
use crate::index::{IndexSnapshot, IndexStore, SearchResult};
use crate::indexing::{BuildHandle, BuildOrchestrator, BuildOutcome, BuildReport, ProgressSink};
use crate::metadata::{Field, Method, Module, TypeDefinition, TypeKey, TypeLayout};
use crate::metrics::{INDEXED_KEYS, INDEXED_RECORDS};
use crate::search::{QueryEngine, SearchFlags};
use crate::source::{MetadataSource, SerializedSource};

/// Searchable index over the metadata of one inspected process.
///
/// Cheap to share behind an `Arc`; queries and builds may run from any
/// thread at the same time.
pub struct MetadataIndex {
    source: Arc<SerializedSource>,
    store: Arc<IndexStore>,
    orchestrator: BuildOrchestrator,
    engine: QueryEngine,
}

impl MetadataIndex {
    pub fn new(source: Arc<dyn MetadataSource>, config: &Config) -> Self {
        let source = Arc::new(SerializedSource::new(source));
        let store = Arc::new(IndexStore::new());
        let orchestrator =
            BuildOrchestrator::new(source.clone(), store.clone(), config.indexer.clone());
        let engine = QueryEngine::new(store.clone(), config.search.clone());

        Self {
            source,
            store,
            orchestrator,
            engine,
        }
    }

    /// Start a background build; see [`BuildOrchestrator::start_build`]
    pub fn start_build(
        &self,
        progress: Option<Arc<dyn ProgressSink>>,
        cancel: Option<CancellationToken>,
    ) -> IndexResult<BuildHandle> {
        self.orchestrator.start_build(progress, cancel)
    }

    pub async fn build_index(
        &self,
        progress: Option<Arc<dyn ProgressSink>>,
        cancel: Option<CancellationToken>,
    ) -> IndexResult<BuildOutcome> {
        self.orchestrator.build_index(progress, cancel).await
    }

    pub fn is_built(&self) -> bool {
        self.store.is_built()
    }

    pub fn is_building(&self) -> bool {
        self.orchestrator.is_building()
    }

    /// Distinct records in the published index, 0 when nothing is built
    pub fn indexed_item_count(&self) -> usize {
        self.store.record_count()
    }

    pub fn key_count(&self) -> usize {
        self.store.snapshot().map_or(0, |s| s.index.key_count())
    }

    /// Bumped by every publish and every clear
    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    pub fn search(
        &self,
        query: &str,
        flags: SearchFlags,
        max_results: usize,
    ) -> IndexResult<Vec<Arc<SearchResult>>> {
        self.engine.search(query, flags, max_results)
    }

    pub async fn search_async(
        &self,
        query: impl Into<String>,
        flags: SearchFlags,
        max_results: usize,
    ) -> IndexResult<Vec<Arc<SearchResult>>> {
        self.engine.search_async(query.into(), flags, max_results).await
    }

    pub fn find_type_by_name(&self, name: &str) -> IndexResult<Option<Arc<SearchResult>>> {
        self.engine.find_type_by_name(name)
    }

    pub fn find_methods_by_name(&self, name: &str) -> IndexResult<Vec<Arc<SearchResult>>> {
        self.engine.find_methods_by_name(name)
    }

    pub fn find_fields_by_name(&self, name: &str) -> IndexResult<Vec<Arc<SearchResult>>> {
        self.engine.find_fields_by_name(name)
    }

    /// Drop the published index and ask the source to forget its caches.
    ///
    /// A build running at the same time is not interrupted and publishes
    /// when it finishes.
    pub fn clear_index(&self) {
        self.store.clear();
        self.source.clear_cache();
        INDEXED_RECORDS.set(0.0);
        INDEXED_KEYS.set(0.0);
        info!(source = self.source.source_name(), "Metadata index cleared");
    }

    /// The published snapshot, for callers that want several lookups against
    /// one consistent build
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.store.snapshot()
    }

    pub fn last_report(&self) -> Option<BuildReport> {
        self.store.snapshot().map(|s| s.report.clone())
    }

    pub fn modules(&self) -> IndexResult<Vec<Arc<Module>>> {
        Ok(self.published()?.modules.clone())
    }

    pub fn type_definitions(&self) -> IndexResult<Vec<Arc<TypeDefinition>>> {
        Ok(self.published()?.type_definitions.clone())
    }

    /// Methods fetched for `key` during the last build. `None` when the type
    /// is unknown or its method list could not be read.
    pub fn methods_of(&self, key: TypeKey) -> IndexResult<Option<Arc<[Method]>>> {
        Ok(self.published()?.methods_by_type.get(&key).cloned())
    }

    pub fn fields_of(&self, key: TypeKey) -> IndexResult<Option<Arc<[Field]>>> {
        Ok(self.published()?.fields_by_type.get(&key).cloned())
    }

    /// Instance layout of `type_def`, read once from the source and then
    /// served from the type's cache
    pub fn type_layout(&self, type_def: &TypeDefinition) -> IndexResult<Option<TypeLayout>> {
        Ok(type_def.layout(&*self.source)?)
    }

    fn published(&self) -> IndexResult<Arc<IndexSnapshot>> {
        self.store.snapshot().ok_or(IndexError::NotBuilt)
    }
}
