//! Error taxonomy for build and query operations

use thiserror::Error;

/// Failures reported to callers of the build and query surface.
///
/// Branch-level enumeration failures never surface here; they are skipped
/// and recorded in the build report.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The metadata source did not report itself reachable.
    #[error("Metadata source is not attached")]
    NotAttached,

    /// Another build is already running.
    #[error("An index build is already in progress")]
    AlreadyBuilding,

    /// A query arrived before any index was published.
    #[error("No metadata index has been built")]
    NotBuilt,

    /// The walk could not even start enumerating.
    #[error("Metadata enumeration failed: {0:#}")]
    Source(#[from] anyhow::Error),

    /// The background worker could not run or died.
    #[error("Index worker failed: {0}")]
    Worker(String),
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;
