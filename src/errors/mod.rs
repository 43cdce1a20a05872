//! Error handling for the application
//!
//! Re-exports the error types so callers can use
//! `crate::errors::{AppError, AppResult}`.

pub mod types;

pub use types::AppError;

/// Convenience result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;
