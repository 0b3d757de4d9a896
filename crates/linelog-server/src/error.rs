//! Error types for the linelog server

use std::net::SocketAddr;

use linelog_core::LogError;
use thiserror::Error;

/// Errors that can occur while running the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket or file I/O failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The listening socket could not be set up
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to listen on
        addr: SocketAddr,
        /// Underlying socket error
        source: std::io::Error,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The record log rejected an operation
    #[error("Log error: {0}")]
    Log(#[from] LogError),
}

impl ServerError {
    /// Create a new Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<toml::de::Error> for ServerError {
    fn from(e: toml::de::Error) -> Self {
        ServerError::Config(e.to_string())
    }
}

/// Result type alias for server operations
pub type ServerResult<T> = Result<T, ServerError>;
