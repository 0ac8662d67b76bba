use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::search::SearchFlags;

#[derive(Parser)]
#[command(name = "metascope")]
#[command(author, version, about = "Search type, method and field names in runtime metadata")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration to the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Index a metadata snapshot and search it
    Search {
        /// Snapshot file (JSON) to index
        snapshot: PathBuf,

        /// Search query
        query: String,

        /// Maximum number of results to return (0 for unlimited)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Entity kinds to include; all kinds when omitted
        #[arg(short, long, value_enum)]
        kind: Vec<KindArg>,

        /// Match the whole name instead of any substring
        #[arg(short, long)]
        exact: bool,

        /// Match case exactly
        #[arg(short, long)]
        case_sensitive: bool,
    },

    /// Index a metadata snapshot and show statistics
    Stats {
        /// Snapshot file (JSON) to index
        snapshot: PathBuf,

        /// Output in Prometheus format
        #[arg(long)]
        prometheus: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum KindArg {
    Module,
    Class,
    Method,
    Field,
}

impl KindArg {
    pub fn flag(self) -> SearchFlags {
        match self {
            KindArg::Module => SearchFlags::MODULES,
            KindArg::Class => SearchFlags::CLASSES,
            KindArg::Method => SearchFlags::METHODS,
            KindArg::Field => SearchFlags::FIELDS,
        }
    }
}

/// Combine the command line selection into query flags
pub fn search_flags(kinds: &[KindArg], exact: bool, case_sensitive: bool) -> SearchFlags {
    let mut flags = if kinds.is_empty() {
        SearchFlags::ALL
    } else {
        kinds
            .iter()
            .fold(SearchFlags::empty(), |acc, kind| acc | kind.flag())
    };
    flags.set(SearchFlags::EXACT_MATCH, exact);
    flags.set(SearchFlags::CASE_SENSITIVE, case_sensitive);
    flags
}
