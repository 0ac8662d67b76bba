//! Call gate that serializes access to a non-reentrant source

use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::MetadataSource;
use crate::metadata::{Domain, Field, Method, Module, TypeDefinition, TypeLayout};

/// Wraps a [`MetadataSource`] so that at most one call is in flight at a time,
/// whichever thread issues it.
pub struct SerializedSource {
    inner: Arc<dyn MetadataSource>,
    gate: Mutex<()>,
}

impl SerializedSource {
    pub fn new(inner: Arc<dyn MetadataSource>) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }

    pub fn inner(&self) -> &Arc<dyn MetadataSource> {
        &self.inner
    }

    fn enter(&self) -> MutexGuard<'_, ()> {
        // The gate guards no data, so a panic inside a previous call leaves
        // nothing inconsistent behind.
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetadataSource for SerializedSource {
    fn is_reachable(&self) -> bool {
        let _gate = self.enter();
        self.inner.is_reachable()
    }

    fn enumerate_domains(&self) -> Result<Vec<Domain>> {
        let _gate = self.enter();
        self.inner.enumerate_domains()
    }

    fn enumerate_modules(&self, domain: &Domain) -> Result<Vec<Module>> {
        let _gate = self.enter();
        self.inner.enumerate_modules(domain)
    }

    fn enumerate_type_definitions(&self, module: &Module) -> Result<Vec<TypeDefinition>> {
        let _gate = self.enter();
        self.inner.enumerate_type_definitions(module)
    }

    fn get_methods(&self, type_def: &TypeDefinition) -> Result<Vec<Method>> {
        let _gate = self.enter();
        self.inner.get_methods(type_def)
    }

    fn get_fields(&self, type_def: &TypeDefinition) -> Result<Vec<Field>> {
        let _gate = self.enter();
        self.inner.get_fields(type_def)
    }

    fn get_type_layout(&self, address: u64) -> Result<Option<TypeLayout>> {
        let _gate = self.enter();
        self.inner.get_type_layout(address)
    }

    fn clear_cache(&self) {
        let _gate = self.enter();
        self.inner.clear_cache()
    }

    fn source_name(&self) -> &'static str {
        self.inner.source_name()
    }
}
