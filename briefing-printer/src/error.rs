//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Printer is offline or unreachable
    #[error("Printer offline: {0}")]
    Offline(String),

    /// Printer queue is stopped/paused
    #[error("Printer stopped: {0}")]
    Stopped(String),

    /// Printer queue does not exist
    #[error("Printer not found: {0}")]
    NotFound(String),

    /// Spooler refused the job (native error text)
    #[error("Print rejected: {0}")]
    Rejected(String),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Whether a later attempt could succeed without operator action on the config
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PrintError::NotFound(_) | PrintError::InvalidConfig(_))
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
