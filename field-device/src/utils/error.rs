//! Unified error handling
//!
//! [`AppError`] covers everything the orchestrator can fail on at startup or
//! while wiring components. Per-job printer failures never surface here; the
//! print worker turns them into attempt outcomes instead.
//!
//! # Usage
//!
//! ```ignore
//! Err(AppError::config("PRINT_MAX_RETRIES must be at least 1"))
//! ```

use briefing_printer::PrintError;

/// Application error enum
///
/// | Category | Meaning |
/// |----------|---------|
/// | Config | Invalid or inconsistent configuration |
/// | Printer | Printer unusable at startup (not found, no spooler) |
/// | Gpio | Pin setup failed |
/// | Internal | Wiring mistakes such as starting twice |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Printer error: {0}")]
    Printer(#[from] PrintError),

    #[error("GPIO error: {0}")]
    Gpio(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn gpio(msg: impl Into<String>) -> Self {
        Self::Gpio(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printer_error_converts() {
        let err: AppError = PrintError::NotFound("KX-P1592".into()).into();
        assert!(matches!(err, AppError::Printer(PrintError::NotFound(_))));
        assert_eq!(
            err.to_string(),
            "Printer error: Printer not found: KX-P1592"
        );
    }
}
