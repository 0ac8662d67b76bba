//! Searchable symbol index over the metadata of an inspected process.
//!
//! A [`MetadataSource`] supplies domains, modules, type definitions, methods
//! and fields. [`MetadataIndex`] walks the source on a background worker,
//! publishes an inverted index in one swap and answers exact and substring
//! queries against whatever index was published last.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod indexing;
pub mod logging;
pub mod metadata;
pub mod metrics;
pub mod search;
pub mod service;
pub mod source;

pub use config::Config;
pub use error::{IndexError, IndexResult};
pub use index::{ResultEntry, ResultKind, SearchResult};
pub use indexing::{BuildHandle, BuildOutcome, BuildReport, IndexProgress, ProgressSink};
pub use metadata::{Domain, Field, Method, Module, TypeDefinition, TypeKey, TypeLayout};
pub use search::SearchFlags;
pub use service::MetadataIndex;
pub use source::{MetadataSource, SerializedSource, SnapshotSource};
