//! Authorization error types.
//!
//! Only infrastructure and programming failures are errors. Business
//! outcomes such as "not authenticated", "person not found", "no plant for
//! this request" or "no access to the plant" are expressed through
//! `Option`/`bool` return values and never reach this type.

use std::fmt;

use plantauth_cache::CacheError;

/// Errors raised by the permission/person caches, the remote authorities and
/// the claims augmentation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// A cache key was requested for an identifier that cannot scope it.
    #[error("Invalid cache key: {reason}")]
    InvalidCacheKey {
        /// Why the key could not be built.
        reason: String,
    },

    /// The cache store failed or held an unreadable entry.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A remote authority returned a non-success response or could not be reached.
    #[error("Remote authority error at {url}: {message}")]
    RemoteAuthority {
        /// The requested URL.
        url: String,
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,
}

impl AuthzError {
    /// Creates a new `InvalidCacheKey` error.
    #[must_use]
    pub fn invalid_cache_key(reason: impl Into<String>) -> Self {
        Self::InvalidCacheKey {
            reason: reason.into(),
        }
    }

    /// Creates a new `RemoteAuthority` error.
    #[must_use]
    pub fn remote(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteAuthority {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if a cached value could not be read back as the requested type.
    #[must_use]
    pub fn is_cache_corruption(&self) -> bool {
        matches!(self, Self::Cache(e) if e.is_corruption())
    }

    /// Returns `true` if the operation was cancelled, either directly or
    /// while waiting on the cache.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Cache(e) => e.is_cancelled(),
            _ => false,
        }
    }

    /// Returns `true` if this error indicates a bug in the caller.
    #[must_use]
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::InvalidCacheKey { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidCacheKey { .. } => ErrorCategory::Programming,
            Self::Cache(e) if e.is_cancelled() => ErrorCategory::Cancelled,
            Self::Cache(_) => ErrorCategory::Cache,
            Self::RemoteAuthority { .. } => ErrorCategory::Remote,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// Categories of authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Cache store failures and unreadable entries.
    Cache,
    /// Misuse of the API, such as a nil user identifier.
    Programming,
    /// Remote authority failures.
    Remote,
    /// Configuration errors.
    Configuration,
    /// Caller cancellation.
    Cancelled,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Programming => write!(f, "programming"),
            Self::Remote => write!(f, "remote"),
            Self::Configuration => write!(f, "configuration"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result type alias for authorization operations.
pub type AuthzResult<T> = Result<T, AuthzError>;
