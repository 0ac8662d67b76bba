//! Runtime metadata entities
//!
//! Plain data records produced by a [`MetadataSource`](crate::source::MetadataSource).
//! Everything here is immutable after construction except the lazily filled
//! member caches on [`TypeDefinition`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::source::MetadataSource;

/// An isolated execution context holding its own set of loaded modules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: u64,
    pub name: String,
}

/// Opaque identity handle for a loaded module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleHandle(pub u64);

/// Metadata token of a type definition, unique only within its module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeToken(pub u32);

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Cross-module identity of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub module: ModuleHandle,
    pub token: TypeToken,
}

/// A loaded assembly or library within a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub handle: ModuleHandle,
    #[serde(default)]
    pub base_address: u64,
    pub name: String,
}

/// Instance layout of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLayout {
    pub instance_size: u32,
    #[serde(default)]
    pub vtable_address: u64,
}

/// A class, struct or enum declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub token: TypeToken,
    pub name: String,
    #[serde(default)]
    pub flags: u32,
    /// Token of the parent type, if any
    #[serde(default)]
    pub extends: Option<TypeToken>,
    pub module: ModuleHandle,
    /// Runtime class address used for layout lookups
    #[serde(default)]
    pub address: u64,

    #[serde(skip)]
    methods: OnceLock<Arc<[Method]>>,
    #[serde(skip)]
    fields: OnceLock<Arc<[Field]>>,
    #[serde(skip)]
    layout: OnceLock<Option<TypeLayout>>,
}

impl TypeDefinition {
    pub fn new(module: ModuleHandle, token: TypeToken, name: impl Into<String>) -> Self {
        Self {
            token,
            name: name.into(),
            flags: 0,
            extends: None,
            module,
            address: 0,
            methods: OnceLock::new(),
            fields: OnceLock::new(),
            layout: OnceLock::new(),
        }
    }

    pub fn key(&self) -> TypeKey {
        TypeKey {
            module: self.module,
            token: self.token,
        }
    }

    /// Methods of this type, fetched from `source` on first successful call
    pub fn methods(&self, source: &dyn MetadataSource) -> Result<Arc<[Method]>> {
        if let Some(methods) = self.methods.get() {
            return Ok(methods.clone());
        }
        let fetched: Arc<[Method]> = source.get_methods(self)?.into();
        // A concurrent filler may have won; keep whichever landed first.
        Ok(self.methods.get_or_init(|| fetched).clone())
    }

    /// Fields of this type, fetched from `source` on first successful call
    pub fn fields(&self, source: &dyn MetadataSource) -> Result<Arc<[Field]>> {
        if let Some(fields) = self.fields.get() {
            return Ok(fields.clone());
        }
        let fetched: Arc<[Field]> = source.get_fields(self)?.into();
        Ok(self.fields.get_or_init(|| fetched).clone())
    }

    /// Instance layout, fetched from `source` on first successful call
    pub fn layout(&self, source: &dyn MetadataSource) -> Result<Option<TypeLayout>> {
        if let Some(layout) = self.layout.get() {
            return Ok(*layout);
        }
        let fetched = source.get_type_layout(self.address)?;
        Ok(*self.layout.get_or_init(|| fetched))
    }

    /// Methods already cached on this entity, without touching the source
    pub fn cached_methods(&self) -> Option<Arc<[Method]>> {
        self.methods.get().cloned()
    }

    /// Fields already cached on this entity, without touching the source
    pub fn cached_fields(&self) -> Option<Arc<[Field]>> {
        self.fields.get().cloned()
    }
}

/// A single method parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub token: u32,
    pub name: String,
    #[serde(default)]
    pub attributes: u32,
    #[serde(default)]
    pub impl_flags: u32,
    /// Primary compiled code address
    #[serde(default)]
    pub code_address: Option<u64>,
    /// Additional code variants (e.g. re-jitted or shared generic instances)
    #[serde(default)]
    pub secondary_code_addresses: Vec<u64>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Method {
    pub fn new(token: u32, name: impl Into<String>) -> Self {
        Self {
            token,
            name: name.into(),
            attributes: 0,
            impl_flags: 0,
            code_address: None,
            secondary_code_addresses: Vec::new(),
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub type_name: String,
    /// Byte offset within the instance layout
    #[serde(default)]
    pub offset: u32,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, offset: u32) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            offset,
        }
    }
}
