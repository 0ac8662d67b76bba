//! Search result records

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::metadata::{Field, Method, Module, TypeDefinition};
use crate::search::SearchFlags;

/// Which leaf entity a [`SearchResult`] points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultKind {
    Module,
    TypeDefinition,
    Method,
    Field,
}

impl ResultKind {
    /// The kind filter bit selecting this kind
    pub fn flag(self) -> SearchFlags {
        match self {
            ResultKind::Module => SearchFlags::MODULES,
            ResultKind::TypeDefinition => SearchFlags::CLASSES,
            ResultKind::Method => SearchFlags::METHODS,
            ResultKind::Field => SearchFlags::FIELDS,
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Module => write!(f, "module"),
            ResultKind::TypeDefinition => write!(f, "type"),
            ResultKind::Method => write!(f, "method"),
            ResultKind::Field => write!(f, "field"),
        }
    }
}

/// The leaf entity together with the owning type for members
#[derive(Debug, Clone)]
pub enum ResultEntry {
    Module,
    TypeDefinition(Arc<TypeDefinition>),
    Method {
        owner: Arc<TypeDefinition>,
        method: Arc<Method>,
    },
    Field {
        owner: Arc<TypeDefinition>,
        field: Arc<Field>,
    },
}

/// One indexed entity plus the ancestor chain needed to render its path
#[derive(Debug, Clone)]
pub struct SearchResult {
    module: Arc<Module>,
    entry: ResultEntry,
    path: String,
}

impl SearchResult {
    pub fn for_module(module: Arc<Module>) -> Self {
        let path = render_path(&[&module.name]);
        Self {
            module,
            entry: ResultEntry::Module,
            path,
        }
    }

    pub fn for_type(module: Arc<Module>, type_def: Arc<TypeDefinition>) -> Self {
        let path = render_path(&[&module.name, &type_def.name]);
        Self {
            module,
            entry: ResultEntry::TypeDefinition(type_def),
            path,
        }
    }

    pub fn for_method(module: Arc<Module>, owner: Arc<TypeDefinition>, method: Arc<Method>) -> Self {
        let path = render_path(&[&module.name, &owner.name, &method.name]);
        Self {
            module,
            entry: ResultEntry::Method { owner, method },
            path,
        }
    }

    pub fn for_field(module: Arc<Module>, owner: Arc<TypeDefinition>, field: Arc<Field>) -> Self {
        let path = render_path(&[&module.name, &owner.name, &field.name]);
        Self {
            module,
            entry: ResultEntry::Field { owner, field },
            path,
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self.entry {
            ResultEntry::Module => ResultKind::Module,
            ResultEntry::TypeDefinition(_) => ResultKind::TypeDefinition,
            ResultEntry::Method { .. } => ResultKind::Method,
            ResultEntry::Field { .. } => ResultKind::Field,
        }
    }

    /// Display name of the leaf entity
    pub fn name(&self) -> &str {
        match &self.entry {
            ResultEntry::Module => &self.module.name,
            ResultEntry::TypeDefinition(ty) => &ty.name,
            ResultEntry::Method { method, .. } => &method.name,
            ResultEntry::Field { field, .. } => &field.name,
        }
    }

    /// Dotted `module.type.member` path; the deduplication identity
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entry(&self) -> &ResultEntry {
        &self.entry
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// The type definition itself, or the owner of a member
    pub fn type_definition(&self) -> Option<&Arc<TypeDefinition>> {
        match &self.entry {
            ResultEntry::Module => None,
            ResultEntry::TypeDefinition(ty) => Some(ty),
            ResultEntry::Method { owner, .. } | ResultEntry::Field { owner, .. } => Some(owner),
        }
    }

    pub fn method(&self) -> Option<&Arc<Method>> {
        match &self.entry {
            ResultEntry::Method { method, .. } => Some(method),
            _ => None,
        }
    }

    pub fn field(&self) -> Option<&Arc<Field>> {
        match &self.entry {
            ResultEntry::Field { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind(), self.path)
    }
}

fn render_path(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".")
}
