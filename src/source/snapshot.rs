//! Metadata source backed by a captured JSON snapshot
//!
//! Useful for offline analysis of a previously dumped process and as a
//! deterministic source in tests.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::MetadataSource;
use crate::metadata::{
    Domain, Field, Method, Module, ModuleHandle, TypeDefinition, TypeKey, TypeLayout,
};

/// Serialized form of a whole inspected process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub domains: Vec<DomainSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSnapshot {
    pub domain: Domain,
    #[serde(default)]
    pub modules: Vec<ModuleSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    pub module: Module,
    #[serde(default)]
    pub types: Vec<TypeSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSnapshot {
    pub definition: TypeDefinition,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub layout: Option<TypeLayout>,
}

impl Snapshot {
    /// Parse a snapshot from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse metadata snapshot")
    }

    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot from {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("Invalid snapshot in {:?}", path))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata snapshot")
    }
}

/// [`MetadataSource`] answering from an in-memory [`Snapshot`]
pub struct SnapshotSource {
    snapshot: Snapshot,
    modules_by_domain: HashMap<u64, Vec<Module>>,
    types_by_module: HashMap<ModuleHandle, Vec<TypeDefinition>>,
    members: HashMap<TypeKey, (Vec<Method>, Vec<Field>)>,
    layouts: HashMap<u64, TypeLayout>,
    reachable: AtomicBool,
    member_fetches: AtomicUsize,
    cache_clears: AtomicUsize,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        let mut modules_by_domain = HashMap::new();
        let mut types_by_module = HashMap::new();
        let mut members = HashMap::new();
        let mut layouts = HashMap::new();

        for domain in &snapshot.domains {
            let modules: Vec<Module> = domain.modules.iter().map(|m| m.module.clone()).collect();
            modules_by_domain.insert(domain.domain.id, modules);

            for module in &domain.modules {
                let mut definitions = Vec::with_capacity(module.types.len());
                for ty in &module.types {
                    definitions.push(ty.definition.clone());
                    members.insert(
                        ty.definition.key(),
                        (ty.methods.clone(), ty.fields.clone()),
                    );
                    if let Some(layout) = ty.layout {
                        layouts.insert(ty.definition.address, layout);
                    }
                }
                types_by_module.insert(module.module.handle, definitions);
            }
        }

        Self {
            snapshot,
            modules_by_domain,
            types_by_module,
            members,
            layouts,
            reachable: AtomicBool::new(true),
            member_fetches: AtomicUsize::new(0),
            cache_clears: AtomicUsize::new(0),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(Snapshot::from_json(json)?))
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Simulate the target process attaching or detaching
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of method, field and layout lookups served so far
    pub fn member_fetch_count(&self) -> usize {
        self.member_fetches.load(Ordering::SeqCst)
    }

    pub fn cache_clear_count(&self) -> usize {
        self.cache_clears.load(Ordering::SeqCst)
    }

    /// All modules of all domains, in enumeration order
    pub fn modules_flat(&self) -> Vec<Module> {
        self.snapshot
            .domains
            .iter()
            .flat_map(|d| d.modules.iter().map(|m| m.module.clone()))
            .collect()
    }

    fn members_of(&self, type_def: &TypeDefinition) -> Result<&(Vec<Method>, Vec<Field>)> {
        self.member_fetches.fetch_add(1, Ordering::SeqCst);
        self.members
            .get(&type_def.key())
            .ok_or_else(|| anyhow!("Unknown type {} ({})", type_def.name, type_def.token))
    }
}

impl MetadataSource for SnapshotSource {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn enumerate_domains(&self) -> Result<Vec<Domain>> {
        Ok(self
            .snapshot
            .domains
            .iter()
            .map(|d| d.domain.clone())
            .collect())
    }

    fn enumerate_modules(&self, domain: &Domain) -> Result<Vec<Module>> {
        self.modules_by_domain
            .get(&domain.id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown domain {} ({})", domain.name, domain.id))
    }

    fn enumerate_type_definitions(&self, module: &Module) -> Result<Vec<TypeDefinition>> {
        self.types_by_module
            .get(&module.handle)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown module {}", module.name))
    }

    fn get_methods(&self, type_def: &TypeDefinition) -> Result<Vec<Method>> {
        Ok(self.members_of(type_def)?.0.clone())
    }

    fn get_fields(&self, type_def: &TypeDefinition) -> Result<Vec<Field>> {
        Ok(self.members_of(type_def)?.1.clone())
    }

    fn get_type_layout(&self, address: u64) -> Result<Option<TypeLayout>> {
        self.member_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.layouts.get(&address).copied())
    }

    fn clear_cache(&self) {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
    }

    fn source_name(&self) -> &'static str {
        "snapshot"
    }
}
