//! Utility module - shared error type and logging
//!
//! - [`AppError`] / [`AppResult`] - application error type
//! - [`logger`] - tracing subscriber setup and log retention

pub mod error;
pub mod logger;

pub use error::{AppError, AppResult};
