//! Authorization-cache error types.
//!
//! Lookup misses are not errors; the variants here cover the failure paths
//! that can actually occur: the persistence layer failing during a reload,
//! bad configuration, and internal invariant violations.

/// Errors that can occur during authorization-cache operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthCacheError {
    /// An error occurred while fetching authorization data from the
    /// persistence layer.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The cache configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthCacheError {
    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
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

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the error came from the persistence layer.
    ///
    /// Storage errors are retryable: the scheduler retries them on the next
    /// tick, while configuration and internal errors are not expected to
    /// heal on their own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}
