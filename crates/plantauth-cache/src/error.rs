//! Cache error types.

/// Errors that can occur while reading or writing the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A cached value exists but cannot be read as the requested type.
    ///
    /// This signals a schema mismatch between the writer and the reader of
    /// the entry and is never treated as a miss.
    #[error("Failed to deserialize cached value for key {key} as {type_name}: {source}")]
    Corrupted {
        /// The cache key holding the unreadable value.
        key: String,
        /// The Rust type the caller asked for.
        type_name: &'static str,
        /// The underlying decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be serialized before being written.
    #[error("Failed to serialize value for key {key}: {source}")]
    Serialization {
        /// The cache key being written.
        key: String,
        /// The underlying encoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The backing store rejected an operation.
    #[error("Cache backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },

    /// The operation was cancelled before it completed.
    #[error("Cache operation cancelled")]
    Cancelled,
}

impl CacheError {
    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if a cached entry was present but unreadable.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupted { .. })
    }

    /// Returns `true` if the operation was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
