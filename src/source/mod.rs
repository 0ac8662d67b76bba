//! Metadata source abstraction
//!
//! The indexer never talks to the inspected process directly. Everything it
//! knows comes through [`MetadataSource`], which a host integration implements
//! on top of whatever bridge reaches the target runtime.

mod serialized;
mod snapshot;

use anyhow::Result;

use crate::metadata::{Domain, Field, Method, Module, TypeDefinition, TypeLayout};

pub use serialized::SerializedSource;
pub use snapshot::{DomainSnapshot, ModuleSnapshot, Snapshot, SnapshotSource, TypeSnapshot};

/// Supplier of runtime metadata.
///
/// Every call may fail independently and may block for a long time. The
/// indexer only ever calls a source from one thread at a time (see
/// [`SerializedSource`]), so implementations need not be reentrant.
pub trait MetadataSource: Send + Sync {
    /// Whether the inspected process can currently be reached
    fn is_reachable(&self) -> bool;

    fn enumerate_domains(&self) -> Result<Vec<Domain>>;

    fn enumerate_modules(&self, domain: &Domain) -> Result<Vec<Module>>;

    fn enumerate_type_definitions(&self, module: &Module) -> Result<Vec<TypeDefinition>>;

    fn get_methods(&self, type_def: &TypeDefinition) -> Result<Vec<Method>>;

    fn get_fields(&self, type_def: &TypeDefinition) -> Result<Vec<Field>>;

    fn get_type_layout(&self, address: u64) -> Result<Option<TypeLayout>>;

    /// Drop any results the source memoized on its side
    fn clear_cache(&self);

    /// Source name for logging
    fn source_name(&self) -> &'static str {
        "metadata"
    }
}
