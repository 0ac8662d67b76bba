//! Query side of the metadata index.
//!
//! This module contains:
//! - `flags` - kind and match-mode selection for a query
//! - `engine` - exact and ranked substring search over the published index

pub mod engine;
pub mod flags;

pub use engine::{exact_lookup, substring_search, QueryEngine};
pub use flags::SearchFlags;
