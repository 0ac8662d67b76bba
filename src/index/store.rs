//! Published index holder with atomic swap

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use super::inverted::SearchIndex;
use crate::indexing::BuildReport;
use crate::metadata::{Field, Method, Module, TypeDefinition, TypeKey};

/// Everything one successful build produced. Immutable once published.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub index: SearchIndex,
    pub modules: Vec<Arc<Module>>,
    pub type_definitions: Vec<Arc<TypeDefinition>>,
    pub methods_by_type: HashMap<TypeKey, Arc<[Method]>>,
    pub fields_by_type: HashMap<TypeKey, Arc<[Field]>>,
    pub report: BuildReport,
    pub built_at: DateTime<Utc>,
}

impl IndexSnapshot {
    pub fn record_count(&self) -> usize {
        self.index.record_count()
    }
}

/// Holds the currently published [`IndexSnapshot`].
///
/// Publish and clear swap a pointer under the write lock. Readers clone the
/// `Arc` under a short read lock and then work on the snapshot with no lock
/// held, so a publish never waits on a running query.
#[derive(Debug, Default)]
pub struct IndexStore {
    current: RwLock<Option<Arc<IndexSnapshot>>>,
    generation: AtomicU64,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot; returns the new generation
    pub fn publish(&self, snapshot: IndexSnapshot) -> u64 {
        let records = snapshot.record_count();
        let keys = snapshot.index.key_count();
        let snapshot = Arc::new(snapshot);

        let generation = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = Some(snapshot);
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        info!(generation, records, keys, "Published metadata index");
        generation
    }

    /// Drop the published snapshot
    pub fn clear(&self) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.take().is_some() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            info!("Cleared metadata index");
        }
    }

    /// The current snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<IndexSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_built(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn record_count(&self) -> usize {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |s| s.record_count())
    }

    /// Bumped on every publish and on every clear of a built index
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
