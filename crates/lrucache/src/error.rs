//! Error types for lrucache

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error types for cache operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Caller contract violation: zero capacity or an absent key
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Strict lookup on a key that is not cached
    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

impl CacheError {
    /// Returns true for [`CacheError::KeyNotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound(_))
    }

    /// Returns true for [`CacheError::InvalidArgument`]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, CacheError::InvalidArgument(_))
    }
}
