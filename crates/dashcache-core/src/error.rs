//! Error types for cache store operations

use thiserror::Error;

/// Error type for every cache store operation
///
/// Cloneable so that a single failure can be handed to several waiters.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed (corrupt or incompatible payload)
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Store connection failed
    #[error("connection error: {0}")]
    Connection(String),

    /// Store operation failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Timeout
    #[error("operation timed out")]
    Timeout,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for cache store operations
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::Connection("refused".to_string());
        assert_eq!(err.to_string(), "connection error: refused");

        let err = CacheError::Deserialization("eof".to_string());
        assert_eq!(err.to_string(), "deserialization error: eof");

        assert_eq!(CacheError::Timeout.to_string(), "operation timed out");
    }

    #[test]
    fn test_error_clone() {
        let err = CacheError::Backend("down".to_string());
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
