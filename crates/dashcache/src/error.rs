//! Errors surfaced by report operations

use std::fmt::Display;

use dashcache_core::CacheError;
use thiserror::Error;

/// Error returned to callers of the report engine
///
/// Cloneable so a single failed recomputation can be delivered, unchanged,
/// to every caller that joined it. Cache misses, corrupt payloads and store
/// write/evict failures never show up here.
#[derive(Error, Debug, Clone)]
pub enum ReportError {
    /// An aggregation query failed
    #[error("repository error: {0}")]
    Repository(String),

    /// The request deadline elapsed before the report was ready
    #[error("report request timed out")]
    Timeout,

    /// The shared computation ended without producing a result
    #[error("in-flight computation for {key} ended without a result")]
    Aborted { key: String },

    /// Direct cache store failure
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ReportError {
    /// Wrap a repository failure, keeping its message verbatim
    pub fn repository(err: impl Display) -> Self {
        ReportError::Repository(err.to_string())
    }
}

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, ReportError>;
