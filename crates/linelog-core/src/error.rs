//! Error types for linelog-core
//!
//! Every failure is returned to the immediate caller. Eviction is not an
//! error and never shows up here.

use thiserror::Error;

/// Errors that can occur while appending to or reading from a log
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogError {
    /// An allocation failed, or a record would exceed the configured size
    /// limit. Previously committed records and pending bytes are unchanged.
    #[error("Out of memory: could not allocate {requested} bytes")]
    OutOfMemory {
        /// Number of bytes the failed allocation asked for
        requested: usize,
    },

    /// The wait for the log lock was interrupted before it was acquired
    #[error("Operation cancelled while waiting for the log lock")]
    Cancelled,

    /// Copying bytes across the caller boundary failed
    #[error("Copy fault: {0}")]
    CopyFault(String),

    /// A ring was requested with a capacity it cannot hold records in
    #[error("Invalid ring capacity: {0}")]
    InvalidCapacity(usize),
}

impl LogError {
    /// Create a new OutOfMemory error
    pub fn out_of_memory(requested: usize) -> Self {
        Self::OutOfMemory { requested }
    }

    /// Create a new CopyFault error
    pub fn copy_fault(message: impl Into<String>) -> Self {
        Self::CopyFault(message.into())
    }

    /// Whether the failed operation left the log untouched and may simply
    /// be retried with the same input
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. } | Self::Cancelled)
    }
}

impl From<std::collections::TryReserveError> for LogError {
    fn from(_: std::collections::TryReserveError) -> Self {
        // The std error does not expose the requested size.
        LogError::OutOfMemory { requested: 0 }
    }
}

/// Result type alias for log operations
pub type LogResult<T> = Result<T, LogError>;
